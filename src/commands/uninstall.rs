//! Uninstall command CLI wrapper

use crate::error::Result;
use crate::operations::{Outcome, UninstallOperation};
use crate::prompt;

use super::Invocation;

/// Run uninstall command
///
/// Only needs the app paths; no project configuration is read.
pub fn run(invocation: &Invocation) -> Result<()> {
    let paths = invocation.paths()?;
    let confirmer = prompt::confirmer(invocation.no_interaction);

    if UninstallOperation::new(&paths, confirmer.as_ref()).execute()? == Outcome::Declined {
        println!("Uninstall cancelled.");
    }
    Ok(())
}
