use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). For private chats this equals the user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Geographic coordinate stored for weather subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Which way an amount-entry dialogue converts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionDirection {
    UsdToLocal,
    LocalToUsd,
    EurToLocal,
    LocalToEur,
}

impl ConversionDirection {
    /// The foreign currency this direction trades against.
    pub fn foreign_code(self) -> &'static str {
        match self {
            Self::UsdToLocal | Self::LocalToUsd => "USD",
            Self::EurToLocal | Self::LocalToEur => "EUR",
        }
    }

    /// True when the entered amount is in the foreign currency.
    pub fn to_local(self) -> bool {
        matches!(self, Self::UsdToLocal | Self::EurToLocal)
    }
}

/// Why a location is being requested from the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationPurpose {
    OneShotForecast,
    WeatherSubscription,
}

/// A recognized menu action, resolved from raw button text at the transport
/// boundary. The core never sees label strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuIntent {
    ShowRates,
    Convert(ConversionDirection),
    ToggleCurrencyDigest,
    ForecastNow,
    ToggleWeatherDigest,
    Help,
}
