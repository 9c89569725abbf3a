use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::format;
use crate::platform::{ChatSink, Choice, Event, IncomingUpdate};
use crate::services::currency::CurrencyRate;
use crate::services::news::NewsItem;
use crate::services::weather::{City, WeatherReport};
use crate::services::{fetch_or_apologize, Services};

/// What an update is matched against
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A slash command, compared without the leading `/`
    Command(&'static str),
    /// An inline button's callback identifier
    Callback(&'static str),
}

/// The handler a trigger selects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Start,
    Help,
    ChooseCity,
    Weather(City),
    News,
    Currency,
}

/// Maps triggers to handlers and runs them against the configured services.
/// Built once at startup; holds no per-update state.
pub struct Router {
    routes: Vec<(Trigger, Action)>,
    services: Services,
    feeds: Vec<FeedConfig>,
    sink: Arc<dyn ChatSink>,
    bot_username: Option<String>,
}

/// Command name of a message, if it starts with one: `/weather@my_bot now` → `weather`.
/// A command addressed to another bot (`@mention` differing from `bot_username`) is not a command.
fn command_name<'a>(text: &'a str, bot_username: Option<&str>) -> Option<&'a str> {
    let token = text.split_whitespace().next()?;
    let command = token.strip_prefix('/')?;
    let (name, mention) = match command.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (command, None),
    };
    if let (Some(mention), Some(own)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(own.trim_start_matches('@')) {
            return None;
        }
    }
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

impl Router {
    pub fn new(services: Services, feeds: Vec<FeedConfig>, sink: Arc<dyn ChatSink>) -> Self {
        let mut routes = vec![
            (Trigger::Command("start"), Action::Start),
            (Trigger::Command("help"), Action::Help),
            (Trigger::Command("weather"), Action::ChooseCity),
            (Trigger::Command("news"), Action::News),
            (Trigger::Command("currency"), Action::Currency),
        ];
        routes.extend(
            City::ALL
                .into_iter()
                .map(|city| (Trigger::Callback(city.callback_id()), Action::Weather(city))),
        );

        Self {
            routes,
            services,
            feeds,
            sink,
            bot_username: None,
        }
    }

    /// Only answer `/command@name` when `name` is this bot
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Select the handler for an event. `None` means fallback for text and ignore for callbacks.
    pub fn resolve(&self, event: &Event) -> Option<Action> {
        self.routes
            .iter()
            .find(|(trigger, _)| match (trigger, event) {
                (Trigger::Command(name), Event::Text(text)) => {
                    command_name(text, self.bot_username.as_deref()) == Some(*name)
                },
                (Trigger::Callback(id), Event::Callback(data)) => data == id,
                _ => false,
            })
            .map(|(_, action)| *action)
    }

    /// Handle one update. Never fails: upstream errors become apology replies
    /// and failed sends are logged.
    pub async fn dispatch(&self, update: &IncomingUpdate) {
        let chat_id = update.chat_id;

        match self.resolve(&update.event) {
            Some(action) => {
                info!(
                    "{} update from {} in chat {}: {:?}",
                    update.platform, update.user_name, chat_id, action
                );
                self.run(action, update).await;
            }
            None => match &update.event {
                Event::Text(_) => {
                    debug!("No route for text from chat {}, sending fallback", chat_id);
                    self.reply(chat_id, &format::fallback(&update.user_name))
                        .await;
                }
                Event::Callback(data) => {
                    warn!("Ignoring unknown callback {:?} from chat {}", data, chat_id);
                }
            },
        }
    }

    async fn run(&self, action: Action, update: &IncomingUpdate) {
        let chat_id = update.chat_id;

        match action {
            Action::Start => self.reply(chat_id, &format::start()).await,
            Action::Help => self.reply(chat_id, &format::help(&update.user_name)).await,
            Action::ChooseCity => {
                let choices: Vec<Choice> = City::ALL
                    .into_iter()
                    .map(|city| Choice::new(city.name(), city.callback_id()))
                    .collect();
                if let Err(e) = self
                    .sink
                    .send_choices(chat_id, format::CITY_PROMPT, &choices)
                    .await
                {
                    warn!("Failed to send city keyboard: {:#}", e);
                }
            }
            Action::Weather(city) => {
                let name = city.name();
                let text = fetch_or_apologize(
                    name,
                    self.services.weather.current(name),
                    |report: WeatherReport| format::weather(&report),
                    || format::weather_apology(name),
                )
                .await;
                self.reply(chat_id, &text).await;
            }
            Action::News => {
                // One feed at a time; a failing feed does not stop the rest
                for feed in &self.feeds {
                    let text = fetch_or_apologize(
                        &feed.name,
                        self.services.news.latest(feed),
                        |items: Vec<NewsItem>| format::news(&feed.name, &items),
                        || format::news_apology(&feed.name),
                    )
                    .await;
                    self.reply(chat_id, &text).await;
                }
            }
            Action::Currency => {
                let text = fetch_or_apologize(
                    "currency",
                    self.services.currency.rates(),
                    |rates: Vec<CurrencyRate>| format::currency(&rates),
                    || format::CURRENCY_APOLOGY.to_string(),
                )
                .await;
                self.reply(chat_id, &text).await;
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.sink.send_text(chat_id, text).await {
            warn!("Failed to send reply: {:#}", e);
        }
    }
}
