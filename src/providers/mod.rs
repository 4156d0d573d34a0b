// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound integrations: the PostgREST data service and SMTP mail.

pub mod data_api;
pub mod mailer;

pub use data_api::{DataApiClient, DataApiError};
pub use mailer::{
    MailError, MailRequest, MailTransport, OutgoingMail, RecordingMailer, SmtpMailer,
    SmtpSettings, TemplateRenderer,
};
