mod settings;

pub use settings::{
    BudgetSettings, Config, CounterSettings, GatewaySettings, Settings, SourceKind, UiSettings,
    GATEWAY_TOKEN_ENV,
};
