//! Sign in, sign up, sign out.

use std::io::BufRead;

use secrecy::SecretString;

use virtual_wardrobe_storefront::Storefront;

use super::CliError;
use crate::output;

/// Read a password from the first line of stdin.
fn read_password() -> Result<SecretString, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Sign in with email and a password from stdin.
pub async fn login(storefront: &Storefront, email: &str) -> Result<(), CliError> {
    let password = read_password()?;
    let session = storefront.session().sign_in(email, &password).await?;
    if let Some(user) = session.user() {
        output::signed_in(user);
    }
    Ok(())
}

/// Create an account and sign in with it.
pub async fn signup(
    storefront: &Storefront,
    email: &str,
    name: Option<&str>,
) -> Result<(), CliError> {
    let password = read_password()?;
    let session = storefront
        .session()
        .sign_up(email, &password, name)
        .await?;
    if let Some(user) = session.user() {
        output::signed_in(user);
    }
    Ok(())
}

/// Forget the stored session.
pub fn logout(storefront: &Storefront) -> Result<(), CliError> {
    storefront.session().logout()?;
    output::signed_out();
    Ok(())
}

/// Show who is signed in, after validating the stored session.
pub fn whoami(storefront: &Storefront) {
    output::session(&storefront.session().session());
}
