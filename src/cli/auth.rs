use crate::{
    cli::connect,
    config::Settings,
    error,
    error::ApiError,
    info,
    remote::auth as remote_auth,
    success, warning,
};

pub async fn login(email: String, password: String) {
    let settings = Settings::from_env();
    let client = connect(&settings).await;

    match remote_auth::login(&client, &email, &password).await {
        Ok(session) => success!("Logged in as {} ({})", session.user.email, session.role),
        Err(ApiError::Status { status: 401, .. }) => {
            error!("Login failed: wrong email or password")
        }
        Err(e) => error!("Login failed. {} Err: {}", e.user_message(), e),
    }
}

pub async fn logout() {
    let settings = Settings::from_env();
    let client = connect(&settings).await;

    if !client.sessions().is_authenticated() {
        info!("Not logged in.");
        return;
    }

    match remote_auth::logout(&client).await {
        Ok(()) => success!("Logged out."),
        Err(e) => warning!("Logged out locally, but the server call failed: {}", e),
    }
}

pub async fn whoami() {
    let settings = Settings::from_env();
    let client = connect(&settings).await;

    match client.sessions().current() {
        Some(session) => {
            let name = session.user.name.as_deref().unwrap_or("-");
            info!(
                "{} <{}> role: {}",
                name, session.user.email, session.role
            );
        }
        None => warning!("Not logged in. Please run rostercli login"),
    }
}
