//! ConsultBot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use tracing::{info, warn, error};

use ConsultBot::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, DatabaseConfig, create_pool, run_migrations},
    dialog::TopLevelRouter,
    handlers::{Command, handle_callback_query, handle_command, handle_message},
    services::{Services, TelegramMessenger},
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", ConsultBot::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
    run_migrations(&db_pool).await?;

    let database = Arc::new(DatabaseService::new(db_pool));

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    let services = Services::new(
        database.clone(),
        database.clone(),
        database,
        messenger,
        settings,
    );
    let router = Arc::new(TopLevelRouter::new(services));

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    info!("ConsultBot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

/// Handle bot commands
async fn handle_commands(msg: Message, cmd: Command, router: Arc<TopLevelRouter>) -> HandlerResult {
    if let Err(e) = handle_command(msg, cmd, router).await {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages
async fn handle_messages(msg: Message, router: Arc<TopLevelRouter>) -> HandlerResult {
    if let Err(e) = handle_message(msg, router).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(bot: Bot, query: CallbackQuery, router: Arc<TopLevelRouter>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    if let Err(e) = handle_callback_query(bot, query, router).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
