//! Login, session restore and end-to-end encryption setup.
//!
//! A first start logs in with the password and persists the new device. Later
//! starts restore that device from the session store. When a recovery
//! passphrase is configured the bot also sets up cross-signing and key backup
//! so it can read encrypted rooms, without it the bot only works in
//! unencrypted rooms or with keys it received itself.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use matrix_sdk::{
    Client,
    encryption::{
        BackupDownloadStrategy, EncryptionSettings,
        recovery::{RecoveryError, RecoveryState},
    },
    ruma::{OwnedUserId, api::client::uiaa},
};

use crate::matrix::{UserCredentials, session::SessionStore};

const DEVICE_NAME: &str = "menagerie bot";

async fn build_client(credentials: &UserCredentials, store: &SessionStore) -> Result<Client> {
    let user_id: OwnedUserId = credentials
        .user_id
        .as_str()
        .try_into()
        .with_context(|| format!("invalid user id {}", credentials.user_id))?;

    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(store.sqlite_path(), credentials.passphrase.as_deref())
        .with_encryption_settings(EncryptionSettings {
            auto_enable_cross_signing: true,
            backup_download_strategy: BackupDownloadStrategy::default(),
            auto_enable_backups: true,
        })
        .build()
        .await?;

    Ok(client)
}

/// Creates the cross-signing keys, answering the password challenge when the
/// server asks for one.
async fn bootstrap_cross_signing(client: &Client, credentials: &UserCredentials) -> Result<()> {
    let Err(err) = client
        .encryption()
        .bootstrap_cross_signing_if_needed(None)
        .await
    else {
        debug!("cross signing ready");
        return Ok(());
    };

    let Some(challenge) = err.as_uiaa_response() else {
        bail!("cannot bootstrap cross signing: {err:?}");
    };

    let mut password = uiaa::Password::new(
        uiaa::UserIdentifier::UserIdOrLocalpart(credentials.user_id.clone()),
        credentials.password.clone(),
    );
    password.session = challenge.session.clone();

    client
        .encryption()
        .bootstrap_cross_signing(Some(uiaa::AuthData::Password(password)))
        .await?;

    debug!("cross signing bootstrapped");
    Ok(())
}

/// Turns on key backup and secret storage, then unlocks them.
async fn recover(client: &Client, passphrase: &str) -> Result<()> {
    let recovery = client.encryption().recovery();

    match recovery.enable().with_passphrase(passphrase).await {
        Ok(_) => debug!("recovery enabled"),
        Err(RecoveryError::BackupExistsOnServer) => debug!("backup already on the server"),
        Err(err) => bail!("cannot enable recovery: {err:?}"),
    }

    recovery.recover(passphrase).await?;

    if recovery.state() != RecoveryState::Enabled {
        bail!("recovery is not enabled after recovering secrets");
    }

    let device = client
        .encryption()
        .get_own_device()
        .await?
        .ok_or_else(|| anyhow!("own device is unknown"))?;
    if !device.is_verified() {
        bail!("device is not verified after recovering secrets");
    }

    debug!("secrets recovered");
    Ok(())
}

async fn login(credentials: &UserCredentials, store: &SessionStore) -> Result<Client> {
    info!("logging in as {}", credentials.user_id);

    let client = build_client(credentials, store).await?;
    client
        .matrix_auth()
        .login_username(&credentials.user_id, &credentials.password)
        .initial_device_display_name(DEVICE_NAME)
        .send()
        .await
        .context("login failed")?;

    if let Some(passphrase) = &credentials.passphrase {
        bootstrap_cross_signing(&client, credentials).await?;
        recover(&client, passphrase).await?;
    }

    let login = client
        .matrix_auth()
        .session()
        .ok_or_else(|| anyhow!("no session after login"))?;
    store.save_login(&login).await?;

    Ok(client)
}

async fn restore(credentials: &UserCredentials, store: &SessionStore) -> Result<Client> {
    info!("restoring session of {}", credentials.user_id);

    let login = store
        .login()
        .ok_or_else(|| anyhow!("no session to restore"))?
        .clone();

    let client = build_client(credentials, store).await?;
    client
        .restore_session(login)
        .await
        .context("cannot restore session")?;

    if let Some(passphrase) = &credentials.passphrase {
        let secret_store = client
            .encryption()
            .secret_storage()
            .open_secret_store(passphrase)
            .await
            .context("cannot open secret storage")?;
        secret_store.import_secrets().await?;
    }

    Ok(client)
}

/// Returns a logged in client, restoring the stored session when there is one.
pub async fn connect(credentials: &UserCredentials, store: &SessionStore) -> Result<Client> {
    if credentials.passphrase.is_none() {
        warn!("no recovery passphrase configured, encrypted history will not be readable");
    }

    let client = if store.login().is_some() {
        restore(credentials, store).await?
    } else {
        login(credentials, store).await?
    };

    info!("matrix client ready");
    Ok(client)
}
