//! Sign-certificate command CLI wrapper

use crate::cli::SignCertificateArgs;
use crate::error::Result;
use crate::operations::sign_certificate::sign_certificate;
use crate::trust::RcgenIssuer;

use super::Invocation;

/// Run sign-certificate command
pub fn run(invocation: &Invocation, args: SignCertificateArgs) -> Result<()> {
    let paths = invocation.paths()?;
    sign_certificate(&paths, &args.hostnames, &RcgenIssuer)?;
    Ok(())
}
