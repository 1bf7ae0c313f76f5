// Auth endpoints
//
// Login exchanges the admin password for a bearer token, which is
// persisted through the client's `TokenStore` and attached to every
// later request.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{Ack, LoginResponse};

impl DeviceClient {
    /// Authenticate and store the returned token.
    ///
    /// `POST /api/auth/login` with `{"password": "..."}`
    pub async fn login(&self, password: &SecretString) -> Result<LoginResponse, Error> {
        debug!("logging in");
        let resp: LoginResponse = self
            .post(
                "auth/login",
                &json!({ "password": password.expose_secret() }),
            )
            .await?;
        if resp.token.is_empty() {
            return Err(Error::Authentication {
                message: "device returned an empty token".into(),
            });
        }
        self.set_token(Some(SecretString::from(resp.token.clone())))?;
        info!(expires_seconds = ?resp.expires_seconds, "logged in");
        Ok(resp)
    }

    /// Forget the stored token. Purely local; the device keeps no session.
    pub fn logout(&self) -> Result<(), Error> {
        self.set_token(None)
    }

    /// Change the admin password.
    ///
    /// `POST /api/auth/set_password` with `{"password": "..."}`
    pub async fn set_password(&self, password: &SecretString) -> Result<Ack, Error> {
        debug!("changing admin password");
        let ack: Option<Ack> = self
            .post(
                "auth/set_password",
                &json!({ "password": password.expose_secret() }),
            )
            .await?;
        Ok(ack.unwrap_or_default())
    }
}
