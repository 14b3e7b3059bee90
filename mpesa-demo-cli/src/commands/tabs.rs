//! Navigation guard preview
//!
//! Evaluates the storefront guard against a fixed auth state, the same way
//! the shop layout does on each render.

use anyhow::Result;
use mpesa_lib::navigation::{AuthSnapshot, GuardOutcome, NavigationGuard};

use crate::ui;

/// Stand-in for the auth provider's session object.
#[derive(Debug, Clone)]
pub struct DemoSession;

/// Build the auth state described by the CLI flags.
pub fn snapshot(mounting: bool, signed_in: bool) -> AuthSnapshot<DemoSession> {
    AuthSnapshot {
        session: signed_in.then_some(DemoSession),
        mounting,
    }
}

/// Show what the shop layout renders for the given auth state
pub async fn run(mounting: bool, signed_in: bool, as_json: bool, _verbose: bool) -> Result<()> {
    let mut guard = NavigationGuard::new();
    let outcome = guard.render(&snapshot(mounting, signed_in));

    if as_json {
        ui::json(&serde_json::to_value(&outcome)?);
        return Ok(());
    }

    ui::header("Storefront Navigation");
    ui::key_value("Guard phase", &format!("{:?}", guard.phase()));
    ui::separator();

    match outcome {
        GuardOutcome::Loading => ui::info("Loading indicator (session still being determined)"),
        GuardOutcome::Redirect { href } => ui::warning(&format!("Redirect to {}", href)),
        GuardOutcome::Tabs(layout) => {
            ui::success(&format!("{} tabs", layout.screens.len()));
            for screen in &layout.screens {
                ui::key_value(screen.title, &format!("{} ({})", screen.name, screen.icon.name));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpesa_lib::navigation::evaluate;

    #[test]
    fn test_snapshot_flags() {
        assert_eq!(evaluate(&snapshot(true, true)), GuardOutcome::Loading);
        assert!(matches!(
            evaluate(&snapshot(false, false)),
            GuardOutcome::Redirect { href: "/auth" }
        ));
        assert!(matches!(
            evaluate(&snapshot(false, true)),
            GuardOutcome::Tabs(_)
        ));
    }
}
