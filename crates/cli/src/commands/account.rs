//! Session commands: login, register, logout, whoami, password.

use secrecy::SecretString;
use shopfront_client::{Credentials, Registration, Storefront};
use shopfront_core::{Email, User};

use super::CommandError;

/// Log in and persist the session.
pub async fn login(
    storefront: &Storefront,
    email: &str,
    password: String,
) -> Result<(), CommandError> {
    let credentials = Credentials {
        email: Email::parse(email)?,
        password: SecretString::from(password),
    };
    let user = storefront.login(&credentials).await?;
    print_user(&user);
    Ok(())
}

/// Create an account and persist the session.
pub async fn register(
    storefront: &Storefront,
    name: String,
    email: &str,
    password: String,
    phone: Option<String>,
) -> Result<(), CommandError> {
    let registration = Registration {
        name,
        email: Email::parse(email)?,
        password: SecretString::from(password),
        phone,
    };
    let user = storefront.register(&registration).await?;
    print_user(&user);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn logout(storefront: &Storefront) {
    storefront.logout().await;
    println!("Logged out");
}

/// Refresh and print the signed-in user. An expired session is cleared.
pub async fn whoami(storefront: &Storefront) -> Result<(), CommandError> {
    if !storefront.auth().is_authenticated().await {
        return Err(CommandError::NotLoggedIn);
    }
    let user = storefront.refresh_session().await?;
    print_user(&user);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn change_password(
    storefront: &Storefront,
    current: String,
    new: String,
) -> Result<(), CommandError> {
    storefront
        .auth()
        .change_password(&SecretString::from(current), &SecretString::from(new))
        .await?;
    println!("Password changed");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_user(user: &User) {
    println!("{} <{}> ({})", user.name, user.email, user.role);
}
