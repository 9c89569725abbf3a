//! Every text the bot sends, in one place.

use crate::services::currency::CurrencyRate;
use crate::services::news::NewsItem;
use crate::services::weather::WeatherReport;

const COMMANDS_HINT: &str = "Напиши /weather для погоды в Санкт-Петербурге и Краснодаре, /news для получения последних новостей, /currency для курса валют";

const CURRENCY_HEADER: &str = "Текущие курсы валют по отношению к рублю:\n\n";

pub const CITY_PROMPT: &str = "Выберите город:";

pub const NO_CURRENCY_DATA: &str = "Извини, я не нашел данные для выбранных валют.";

pub const CURRENCY_APOLOGY: &str = "Извини, я не смог получить данные о курсах валют.";

pub fn start() -> String {
    "Привет. \nУ меня планируется множество разных функций\n\
     Напиши /weather для погоды в Санкт-Петербурге и Краснодаре, /news для последних новостей, /currency для курса валют"
        .to_string()
}

pub fn help(user_name: &str) -> String {
    format!("Привет, {}.\n{}", user_name, COMMANDS_HINT)
}

pub fn fallback(user_name: &str) -> String {
    format!("Привет, {}\n{}", user_name, COMMANDS_HINT)
}

pub fn weather(report: &WeatherReport) -> String {
    format!(
        "Погода в {}:\nТемпература: {}°C\nПогодные условия: {}",
        report.city, report.temperature, report.description
    )
}

pub fn weather_apology(city: &str) -> String {
    format!("Извини, я не смог получить данные о погоде для {}.", city)
}

pub fn news(feed_name: &str, items: &[NewsItem]) -> String {
    if items.is_empty() {
        return format!(
            "Извини, я не смог найти последние новости на {}.",
            feed_name
        );
    }

    let mut message = format!("Последние новости с {}:\n\n", feed_name);
    for (index, item) in items.iter().enumerate() {
        message.push_str(&format!("{}. {}\n{}\n\n", index + 1, item.title, item.link));
    }
    message
}

pub fn news_apology(feed_name: &str) -> String {
    format!(
        "Извини, произошла ошибка при получении новостей из {}.",
        feed_name
    )
}

pub fn currency(rates: &[CurrencyRate]) -> String {
    if rates.is_empty() {
        return NO_CURRENCY_DATA.to_string();
    }

    let mut message = String::from(CURRENCY_HEADER);
    for rate in rates {
        message.push_str(&format!("{}: {} руб.\n", rate.code, rate.rate));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_message() {
        let text = weather(&WeatherReport {
            city: "Санкт-Петербург".to_string(),
            temperature: -1.5,
            description: "небольшой снег".to_string(),
        });
        assert_eq!(
            text,
            "Погода в Санкт-Петербург:\nТемпература: -1.5°C\nПогодные условия: небольшой снег"
        );
    }

    #[test]
    fn test_whole_temperature_has_no_fraction() {
        let text = weather(&WeatherReport {
            city: "Краснодар".to_string(),
            temperature: 20.0,
            description: "ясно".to_string(),
        });
        assert!(text.contains("Температура: 20°C"));
    }

    #[test]
    fn test_news_numbered_list() {
        let items = vec![
            NewsItem {
                title: "First".to_string(),
                link: "https://a.example/1".to_string(),
            },
            NewsItem {
                title: "Second".to_string(),
                link: "https://a.example/2".to_string(),
            },
        ];
        assert_eq!(
            news("Habr", &items),
            "Последние новости с Habr:\n\n1. First\nhttps://a.example/1\n\n2. Second\nhttps://a.example/2\n\n"
        );
    }

    #[test]
    fn test_news_empty_feed() {
        assert_eq!(
            news("AdIndex", &[]),
            "Извини, я не смог найти последние новости на AdIndex."
        );
    }

    #[test]
    fn test_currency_lines() {
        let rates = vec![
            CurrencyRate {
                code: "USD".to_string(),
                rate: 90.5 / 10.0,
            },
            CurrencyRate {
                code: "CNY".to_string(),
                rate: 12.4,
            },
        ];
        assert_eq!(
            currency(&rates),
            "Текущие курсы валют по отношению к рублю:\n\nUSD: 9.05 руб.\nCNY: 12.4 руб.\n"
        );
    }

    #[test]
    fn test_currency_no_data() {
        assert_eq!(currency(&[]), NO_CURRENCY_DATA);
    }

    #[test]
    fn test_help_and_fallback_greet_by_name() {
        assert!(help("ivan").starts_with("Привет, ivan.\n"));
        assert!(fallback("ivan").starts_with("Привет, ivan\nНапиши /weather"));
        assert!(start().starts_with("Привет. \nУ меня планируется"));
    }
}
