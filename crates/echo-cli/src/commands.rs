use std::path::Path;

use anyhow::{bail, Result};
use echo_core::forms::{AvatarUpload, ProfileForm, RegisterForm, ValidationErrors};
use echo_core::models::{LoginRequest, UserRecord};
use echo_core::{ApiClient, ApiError, Config};
use tracing::warn;

/// Print each failing field, then fail the command
fn report_invalid(errors: ValidationErrors) -> anyhow::Error {
    for (field, message) in errors.iter() {
        println!("  {}: {}", field, message);
    }
    anyhow::anyhow!("Please fix the fields above")
}

fn prompt_password(prompt: &str) -> Result<String> {
    Ok(rpassword::prompt_password(prompt)?)
}

pub async fn register(client: &ApiClient, username: String, email: String, bio: String) -> Result<()> {
    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;

    let form = RegisterForm {
        username,
        email,
        password,
        confirm_password,
        bio,
    };
    let request = form.validate().map_err(report_invalid)?;

    let response = client.auth().register(&request).await?;
    println!(
        "{}",
        response.message.as_deref().unwrap_or("Registration successful")
    );
    println!("Run `echo login --username {}` to sign in.", request.username);
    Ok(())
}

pub async fn login(
    client: &ApiClient,
    config: &mut Config,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let Some(username) = username.or_else(|| config.last_username.clone()) else {
        bail!("No username given and none remembered; pass --username");
    };
    let password = match password {
        Some(password) => password,
        None => prompt_password(&format!("Password for {}: ", username))?,
    };

    let response = client
        .auth()
        .login(&LoginRequest {
            username: username.clone(),
            password,
        })
        .await?;

    match response.user {
        Some(user) => println!("Signed in as {} (@{})", user.display_name(), user.username),
        None => println!("{}", response.message.as_deref().unwrap_or("Signed in")),
    }

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to remember username");
    }
    Ok(())
}

pub fn logout(client: &ApiClient) {
    client.auth().logout();
}

pub fn status(client: &ApiClient, config: &Config) -> Result<()> {
    if !client.auth().is_logged_in() {
        println!("Not signed in ({})", config.api_base_url);
        return Ok(());
    }
    match client.session().user()? {
        Some(user) => println!(
            "Signed in as {} (@{}) at {}",
            user.display_name(),
            user.username,
            config.api_base_url
        ),
        None => println!("Signed in at {}", config.api_base_url),
    }
    Ok(())
}

fn print_profile(user: &UserRecord, config: &Config) {
    let admin = if user.is_admin() { " [admin]" } else { "" };
    println!("{}{}", user.display_name(), admin);
    println!("  Username:  {}", user.username);
    if let Some(email) = &user.email {
        println!("  Email:     {}", email);
    }
    println!("  Bio:       {}", user.bio_display());
    println!("  Joined:    {}", user.joined_display());
    println!(
        "  Followers: {}   Following: {}",
        user.followers_count.unwrap_or(0),
        user.following_count.unwrap_or(0)
    );
    println!("  Avatar:    {}", user.avatar_url(&config.asset_base_url));
}

pub async fn me(client: &ApiClient, config: &Config, json: bool) -> Result<()> {
    client.auth().require_login()?;

    let response = client.user().get_current_user().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response.user)?);
    } else {
        print_profile(&response.user, config);
    }
    Ok(())
}

pub async fn update_profile(
    client: &ApiClient,
    nickname: Option<String>,
    bio: Option<String>,
    change_password: bool,
) -> Result<()> {
    client.auth().require_login()?;

    let password = if change_password {
        let password = prompt_password("New password: ")?;
        let confirm = prompt_password("Confirm new password: ")?;
        if password != confirm {
            return Err(report_invalid(ValidationErrors::single(
                "password",
                "Passwords do not match",
            )));
        }
        password
    } else {
        String::new()
    };

    let form = ProfileForm {
        nickname: nickname.unwrap_or_default(),
        password,
        bio: bio.unwrap_or_default(),
    };
    let update = form.validate().map_err(report_invalid)?;
    if update.is_empty() {
        bail!("Nothing to update; pass --nickname, --bio or --change-password");
    }

    let response = client.user().update_profile(&update).await?;
    println!(
        "{}",
        response
            .message
            .as_deref()
            .unwrap_or("Profile updated successfully")
    );
    Ok(())
}

pub async fn upload_avatar(client: &ApiClient, config: &Config, path: &Path) -> Result<()> {
    client.auth().require_login()?;

    let upload = match AvatarUpload::from_path(path) {
        Ok(upload) => upload,
        Err(ApiError::Validation(errors)) => return Err(report_invalid(errors)),
        Err(e) => return Err(e.into()),
    };

    let user = client.user().upload_avatar_and_refresh(upload).await?;
    println!("Avatar uploaded successfully");
    println!("  {}", user.avatar_url(&config.asset_base_url));
    Ok(())
}
