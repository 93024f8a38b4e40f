//! Weather bot: current weather and forecasts from OpenWeatherMap.

use std::collections::BTreeMap;

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::format_help,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        weather::{Condition, CurrentWeather, Forecast, ForecastStep, WeatherRequester},
    },
    sink::MessageSink,
};

const WEATHER_QUESTION: &str = "For which city would you like to get the weather information?";
const FORECAST_QUESTION: &str = "For which city would you like to get the weather forecast?";
const FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCommand {
    Help,
    Weather,
    Forecast,
    Uptime,
    Feedback,
}

pub struct WeatherBot<R: WeatherRequester> {
    requester: R,
}

impl<R: WeatherRequester> WeatherBot<R> {
    pub fn new(requester: R) -> Self {
        WeatherBot { requester }
    }
}

/// Maps an OpenWeatherMap condition code to an emoji.
///
/// Atmosphere conditions (`7xx`) have no emoji.
pub fn weather_emoji(condition_id: u32) -> &'static str {
    match condition_id {
        200..=299 | 900 | 901 | 902 | 905 => "☈",
        300..=399 => "🌦️",
        500..=599 => "🌧️",
        600..=699 | 903 | 906 => "❄️",
        700..=799 => "",
        800 => "☀️",
        801 => "⛅",
        802 | 803 => "☁️",
        904 => "🌞",
        _ => "😎",
    }
}

fn format_condition(conditions: &[Condition]) -> String {
    match conditions.first() {
        Some(condition) => {
            let emoji = weather_emoji(condition.id);
            if emoji.is_empty() {
                condition.description.clone()
            } else {
                format!("{emoji} {}", condition.description)
            }
        }
        None => "unknown conditions".to_owned(),
    }
}

fn format_place(name: &str, country: &str) -> String {
    if country.is_empty() {
        format!("**{name}**")
    } else {
        format!("**{name}, {country}**")
    }
}

pub fn format_weather(weather: &CurrentWeather) -> String {
    format!(
        "Weather in {}: {}, {:.1}°C (min {:.1}°C, max {:.1}°C), humidity {}%, wind {:.1} m/s",
        format_place(&weather.name, &weather.sys.country),
        format_condition(&weather.weather),
        weather.main.temp,
        weather.main.temp_min,
        weather.main.temp_max,
        weather.main.humidity,
        weather.wind.speed,
    )
}

/// Formats one line per day, using the step at noon when there is one.
pub fn format_forecast(forecast: &Forecast) -> String {
    let mut days: BTreeMap<&str, &ForecastStep> = BTreeMap::new();
    for step in &forecast.list {
        let Some((date, time)) = step.dt_txt.split_once(' ') else {
            continue;
        };
        let entry = days.entry(date).or_insert(step);
        if time == "12:00:00" {
            *entry = step;
        }
    }

    let mut text = format!(
        "Weather forecast for {}:",
        format_place(&forecast.city.name, &forecast.city.country)
    );
    for (date, step) in days.iter().take(FORECAST_DAYS) {
        text.push_str(&format!(
            "\n- {date}: {}, {:.1}°C",
            format_condition(&step.weather),
            step.main.temp
        ));
    }
    text
}

fn format_unknown_city(city: &str) -> String {
    format!("Sorry, I could not find a city called \"{city}\".")
}

impl<R: WeatherRequester> Bot for WeatherBot<R> {
    type Command = WeatherCommand;

    fn name(&self) -> &'static str {
        "weather"
    }

    fn commands(&self) -> CommandTable<WeatherCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", WeatherCommand::Help),
            CommandDefinition::with_argument(
                "weather",
                "Get the current weather of a city.",
                "city",
                WeatherCommand::Weather,
            ),
            CommandDefinition::with_argument(
                "forecast",
                "Get the weather forecast of a city.",
                "city",
                WeatherCommand::Forecast,
            ),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                WeatherCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                WeatherCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<WeatherCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is weather bot v{} speaking.",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "Weather data is provided by [OpenWeatherMap](https://openweathermap.org).",
        )
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, WeatherCommand>,
        command: WeatherCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            WeatherCommand::Help => common::help(ctx).await,
            WeatherCommand::Uptime => common::uptime(ctx).await,
            WeatherCommand::Feedback => common::feedback(ctx, command, argument).await,
            WeatherCommand::Weather => {
                let Some(city) = argument else {
                    ctx.ask(command, WEATHER_QUESTION).await;
                    return Ok(());
                };
                let answer = match self.requester.get_weather(&city).await {
                    Ok(weather) => format_weather(&weather),
                    Err(ServiceError::NotFound) => format_unknown_city(&city),
                    Err(e) => return Err(e),
                };
                ctx.complete();
                ctx.reply(&answer).await;
            }
            WeatherCommand::Forecast => {
                let Some(city) = argument else {
                    ctx.ask(command, FORECAST_QUESTION).await;
                    return Ok(());
                };
                let answer = match self.requester.get_forecast(&city).await {
                    Ok(forecast) => format_forecast(&forecast),
                    Err(ServiceError::NotFound) => format_unknown_city(&city),
                    Err(e) => return Err(e),
                };
                ctx.complete();
                ctx.reply(&answer).await;
            }
        }
        Ok(())
    }
}
