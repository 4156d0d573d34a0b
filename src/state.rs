// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::auth::tokens::InvalidExpiry;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::crypto::{CipherError, SymmetricCipher};
use crate::providers::{DataApiClient, DataApiError, MailError, MailTransport, SmtpMailer, TemplateRenderer};
use crate::store::{DirectoryStore, InMemoryStore, PostgresStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("ENCRYPT_KEY/ENCRYPT_IV: {0}")]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Expiry(#[from] InvalidExpiry),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    DataApi(#[from] DataApiError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub cipher: Arc<SymmetricCipher>,
    pub tokens: Arc<TokenIssuer>,
    pub store: Arc<dyn DirectoryStore>,
    pub data_api: DataApiClient,
    pub mailer: Arc<dyn MailTransport>,
    pub templates: TemplateRenderer,
    /// Skip response encryption for every request.
    pub plain_responses: bool,
    pub env_name: String,
}

impl AppState {
    pub fn new(
        cipher: SymmetricCipher,
        tokens: TokenIssuer,
        store: Arc<dyn DirectoryStore>,
        data_api: DataApiClient,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            cipher: Arc::new(cipher),
            tokens: Arc::new(tokens),
            store,
            data_api,
            mailer,
            templates: TemplateRenderer::default(),
            plain_responses: false,
            env_name: crate::config::DEFAULT_ENV_NAME.to_string(),
        }
    }

    pub fn with_templates(mut self, templates: TemplateRenderer) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_plain_responses(mut self, plain: bool) -> Self {
        self.plain_responses = plain;
        self
    }

    pub fn with_env_name(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = env_name.into();
        self
    }

    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let cipher = SymmetricCipher::new(config.encrypt_key.as_bytes(), config.encrypt_iv.as_bytes())?;
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), &config.token_expiry)?;

        let store: Arc<dyn DirectoryStore> = match &config.database {
            Some(database) => Arc::new(PostgresStore::connect_lazy(database)?),
            None => Arc::new(InMemoryStore::new()),
        };

        let mut data_api = DataApiClient::new(config.api_domain.clone())?;
        if config.use_service_token {
            data_api = data_api.with_service_tokens(tokens.clone());
        }

        let mailer: Arc<dyn MailTransport> = Arc::new(SmtpMailer::new(&config.smtp)?);

        info!(
            api_domain = %config.api_domain,
            use_service_token = config.use_service_token,
            plain_responses = config.plain_responses(),
            "Application state ready"
        );

        Ok(Self::new(cipher, tokens, store, data_api, mailer)
            .with_templates(TemplateRenderer::new(config.mail_template_dir.clone()))
            .with_plain_responses(config.plain_responses())
            .with_env_name(config.env_name.clone()))
    }

    /// Development key and secret, empty directory, recorded mail.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        use crate::auth::TokenExpiry;
        use crate::config::{DEFAULT_ENCRYPT_IV, DEFAULT_ENCRYPT_KEY};
        use crate::providers::RecordingMailer;

        Self::new(
            SymmetricCipher::new(DEFAULT_ENCRYPT_KEY.as_bytes(), DEFAULT_ENCRYPT_IV.as_bytes())
                .expect("development key is 16 bytes"),
            TokenIssuer::new(b"test-secret", &TokenExpiry::default()).expect("default expiry"),
            Arc::new(InMemoryStore::new()),
            DataApiClient::new("http://127.0.0.1:1").expect("client builds"),
            Arc::new(RecordingMailer::new()),
        )
    }
}
