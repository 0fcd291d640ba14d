//! The evaluator's abstract machine state.

use fnv::FnvHashMap;

use crate::config::AnalysisOptions;
use crate::intermediate_representation::{Expr, Tid};
use crate::prelude::*;
use crate::trace::{AddrEntry, Loc, Message};
use crate::utils::log::LogSender;

/// The value currently held at a [`Loc`], and the guest IP that wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocInfo {
    pub expr: Expr,
    pub origin: Option<u64>,
}

/// The evaluator's full mutable state, built up monotonically over one
/// analysis run. Modeled as a plain struct mutated in place by `&mut self`
/// methods rather than threaded functionally, matching the way the pack's
/// own symbolic-state types are driven.
pub struct SymbolicState {
    info: FnvHashMap<Loc, LocInfo>,
    pub(crate) previous_block: Option<Tid>,
    pub(crate) function: String,
    var_names: FnvHashMap<(crate::intermediate_representation::ExprT, AddrEntry), String>,
    var_name_counters: FnvHashMap<crate::intermediate_representation::ExprT, u32>,
    pub(crate) current_ip: Option<u64>,
    warnings: Vec<(Option<u64>, String)>,
    messages: Vec<(Option<u64>, Message)>,
    messages_by_ip: FnvHashMap<u64, Vec<Message>>,
    pub(crate) skip_rest: bool,
    pub(crate) ret_val: Option<Expr>,
    pub funcs_processed: u32,
    pub funcs_total: u32,
    pub options: AnalysisOptions,
    log: Option<LogSender>,
}

impl SymbolicState {
    /// A fresh, empty state for a run with `funcs_total` functions on the
    /// dynamic call path, optionally shipping operational log messages to
    /// `log`.
    pub fn new(options: AnalysisOptions, funcs_total: u32, log: Option<LogSender>) -> SymbolicState {
        SymbolicState {
            info: FnvHashMap::default(),
            previous_block: None,
            function: String::new(),
            var_names: FnvHashMap::default(),
            var_name_counters: FnvHashMap::default(),
            current_ip: None,
            warnings: Vec::new(),
            messages: Vec::new(),
            messages_by_ip: FnvHashMap::default(),
            skip_rest: false,
            ret_val: None,
            funcs_processed: 0,
            funcs_total,
            options,
            log,
        }
    }

    pub fn get(&self, loc: &Loc) -> Option<&LocInfo> {
        self.info.get(loc)
    }

    /// Insert `expr` at `loc`, recording `current_ip` as its origin.
    pub(crate) fn insert(&mut self, loc: Loc, expr: Expr) {
        self.info.insert(
            loc,
            LocInfo {
                expr,
                origin: self.current_ip,
            },
        );
    }

    /// Allocate, or look up, the stable free-variable name for an
    /// uninitialized load at `(ty, addr)`: `"{prettyT}_{loVal16bits:04x}_{counter}"`.
    /// `var_names` is injective by construction: the counter only advances
    /// when a genuinely new `(ty, addr)` pair is seen.
    pub(crate) fn fresh_load_name(
        &mut self,
        ty: crate::intermediate_representation::ExprT,
        addr: AddrEntry,
    ) -> Option<String> {
        if !matches!(
            addr.kind,
            crate::trace::AddrKind::MAddr | crate::trace::AddrKind::HAddr
        ) {
            return None;
        }
        if let Some(existing) = self.var_names.get(&(ty, addr)) {
            return Some(existing.clone());
        }
        let counter = self.var_name_counters.entry(ty).or_insert(0);
        let name = format!(
            "{}T_{:04x}_{}",
            pretty_ty(ty),
            addr.value & 0xffff,
            counter
        );
        *counter += 1;
        self.var_names.insert((ty, addr), name.clone());
        Some(name)
    }

    /// Record that one more function has been processed, reporting
    /// progress to the operational log every `progress_step` functions.
    pub(crate) fn progress_tick(&mut self) {
        self.funcs_processed += 1;
        if let Some(step) = self.options.progress_step(self.funcs_total as usize) {
            if self.funcs_processed as usize % step == 0 {
                if let Some(log) = &self.log {
                    let _ = log.send(crate::utils::log::LogMessage::new_info(format!(
                        "progress: {}/{} functions",
                        self.funcs_processed, self.funcs_total
                    )));
                }
            }
        }
    }

    pub(crate) fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.warnings.push((self.current_ip, text.clone()));
        self.push_message(Message::Warning(Message::format_warning(
            self.current_ip,
            &text,
        )));
        if let Some(log) = &self.log {
            let _ = log.send(crate::utils::log::LogMessage::new_error(&text));
        }
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push((self.current_ip, message.clone()));
        if let Some(ip) = self.current_ip {
            self.messages_by_ip.entry(ip).or_default().push(message);
        }
        if self.is_debug_ip() {
            if let Some(log) = &self.log {
                let _ = log.send(crate::utils::log::LogMessage::new_debug(format!(
                    "{:?}",
                    self.messages.last()
                )));
            }
        }
    }

    pub(crate) fn is_debug_ip(&self) -> bool {
        self.options.debug_ip.is_some() && self.options.debug_ip == self.current_ip
    }

    pub(crate) fn debug_trace(&self, text: impl Into<String>) {
        if self.is_debug_ip() {
            if let Some(log) = &self.log {
                let _ = log.send(crate::utils::log::LogMessage::new_debug(text.into()));
            }
        }
    }

    /// Messages emitted while `current_ip` equaled `ip`, in emission order.
    pub fn messages_by_ip(&self, ip: u64) -> &[Message] {
        self.messages_by_ip
            .get(&ip)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All emitted messages, in emission order, paired with the IP active
    /// when each was emitted.
    pub fn messages(&self) -> &[(Option<u64>, Message)] {
        &self.messages
    }

    /// All warnings, in emission order, paired with the IP active when each
    /// was raised.
    pub fn warnings(&self) -> &[(Option<u64>, String)] {
        &self.warnings
    }
}

fn pretty_ty(ty: crate::intermediate_representation::ExprT) -> &'static str {
    use crate::intermediate_representation::ExprT;
    match ty {
        ExprT::Void => "Void",
        ExprT::Ptr => "Ptr",
        ExprT::Int8 => "Int8",
        ExprT::Int32 => "Int32",
        ExprT::Int64 => "Int64",
        ExprT::Float => "Float",
        ExprT::Double => "Double",
    }
}
