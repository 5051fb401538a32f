//! Subcommand implementations. Each returns the text to print so the
//! rendering can be tested without a terminal.

use std::io::Write;
use std::thread;
use std::time::Duration as StdDuration;

use quota_core::{
    load_token_config, DerivedTokenState, FileTokenStore, StorageConfig, TokenError, TokenHint,
    TokenReconciler, WindowSnapshot,
};
use serde::Serialize;

pub type Reconciler = TokenReconciler<FileTokenStore>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Set(String),
    Clear,
    Migrate { keep_plaintext: bool },
    ClearPlaintext,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(flatten)]
    derived: DerivedTokenState,
    hint: TokenHint,
    hint_message: &'static str,
    windows: WindowSnapshot,
}

pub fn open(storage: &StorageConfig) -> Reconciler {
    let config = load_token_config(storage);
    TokenReconciler::new(FileTokenStore::new(storage), config)
}

fn report(reconciler: &Reconciler) -> StatusReport {
    let derived = reconciler.current_state();
    let hint = TokenHint::for_state(derived.state);
    let machine = reconciler.machine();
    StatusReport {
        derived,
        hint,
        hint_message: hint.message(),
        windows: machine.snapshot_at(machine.now()),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn render_status(reconciler: &Reconciler) -> String {
    let report = report(reconciler);
    format!(
        "State: {} (secure={} plaintext={})\nHint:  {} - {}\n{}",
        report.derived.state.label(),
        yes_no(report.derived.has_secure),
        yes_no(report.derived.has_legacy),
        report.hint.id(),
        report.hint_message,
        report.windows
    )
}

pub fn render_status_json(reconciler: &Reconciler) -> Result<String, TokenError> {
    serde_json::to_string_pretty(&report(reconciler)).map_err(|source| TokenError::Json {
        context: "serialize status".to_string(),
        source,
    })
}

pub fn run_action(reconciler: &mut Reconciler, action: Action) -> Result<String, TokenError> {
    let done = match action {
        Action::Set(token) => {
            reconciler.set_token(&token)?;
            "Token stored securely."
        }
        Action::Clear => {
            reconciler.clear_token()?;
            "Secure token cleared."
        }
        Action::Migrate { keep_plaintext } => {
            reconciler.migrate(keep_plaintext)?;
            if keep_plaintext {
                "Token migrated; plaintext copy kept."
            } else {
                "Token migrated; plaintext copy removed."
            }
        }
        Action::ClearPlaintext => {
            reconciler.clear_plaintext()?;
            "Plaintext copy cleared."
        }
    };
    Ok(format!("{}\n{}", done, render_status(reconciler)))
}

/// Polls the stores and prints a line every time the derived state or hint
/// changes, for `duration` in steps of `interval`.
pub fn watch(
    reconciler: &Reconciler,
    duration: StdDuration,
    interval: StdDuration,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let interval = interval.max(StdDuration::from_millis(1));
    let mut last: Option<DerivedTokenState> = None;
    let mut elapsed = StdDuration::ZERO;

    loop {
        let derived = reconciler.current_state();
        if last != Some(derived) {
            writeln!(
                out,
                "[{:>6}ms] {} -> {} | {}",
                elapsed.as_millis(),
                derived.state.label(),
                TokenHint::for_state(derived.state).id(),
                reconciler.machine().debug_snapshot()
            )?;
            last = Some(derived);
        }

        if elapsed >= duration {
            return Ok(());
        }
        thread::sleep(interval);
        elapsed += interval;
    }
}
