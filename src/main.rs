use gui::App;
use iced::{Application, Settings};
use marketpulse_core::{AppConfig, CoreError, ErrorExt};
use price_client::PriceClient;
use search_client::SearchClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            "marketpulse=debug,gui=debug,search_client=debug,price_client=debug,analytics=debug",
        )
        .init();

    tracing::info!("Starting MarketPulse - Stock Sentiment Dashboard");

    let config = AppConfig::load().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    let search = Arc::new(SearchClient::new(&config)?);
    // Unreachable engine is fatal at startup, not a per-request error.
    if let Err(e) = search.health_check().await {
        e.log_error();
        return Err(e);
    }
    let prices = Arc::new(PriceClient::new(&config)?);

    let flags = gui::Flags {
        config,
        search,
        prices,
    };

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(1200.0, 800.0),
            min_size: Some(iced::Size::new(800.0, 600.0)),
            ..Default::default()
        },
        ..Settings::with_flags(flags)
    };

    MarketPulseApp::run(settings).map_err(|e| {
        tracing::error!("Application error: {}", e);
        CoreError::Internal {
            message: format!("GUI error: {e}"),
        }
    })
}

struct MarketPulseApp {
    app: App,
}

impl Application for MarketPulseApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = gui::Flags;

    fn new(flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        (
            Self {
                app: App::new(flags),
            },
            iced::Command::none(),
        )
    }

    fn title(&self) -> String {
        "MarketPulse - Stock Sentiment Dashboard".to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }
}
