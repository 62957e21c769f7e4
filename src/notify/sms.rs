use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{MessageId, MessageSender};
use crate::error::{ConfigError, NotificationError};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends text messages through the Twilio REST API
pub struct TwilioSender {
    client: Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

impl TwilioSender {
    pub fn new(account_sid: String, auth_token: String, from: String, to: String) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::invalid("use_sms_alert", e.to_string()))?;
        Ok(Self {
            client,
            account_sid,
            auth_token,
            from,
            to,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, self.account_sid)
    }
}

impl MessageSender for TwilioSender {
    fn send_message(&self, body: &str) -> Result<MessageId, NotificationError> {
        let params = [
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(NotificationError::Send(format!("{}: {}", status, text)));
        }

        let message: MessageResource = response.json()?;
        Ok(MessageId(message.sid))
    }
}
