//! Terminal rendering of the weather cards.

use std::collections::HashMap;
use std::io::Write;

use wxboard_core::UiConfig;
use wxboard_weather::{DisplaySurface, WeatherSummary};

const LOADING: &str = "Loading...";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// What one card currently shows
#[derive(Debug, Clone, PartialEq)]
struct Card {
    temperature: Option<i32>,
    condition: String,
    forecast: String,
    updated: Option<String>,
}

impl Default for Card {
    fn default() -> Self {
        Self {
            temperature: None,
            condition: LOADING.to_string(),
            forecast: String::new(),
            updated: None,
        }
    }
}

pub struct TerminalDashboard {
    title: String,
    unit_symbol: &'static str,
    card_width: usize,
    cards_per_row: usize,
    show_detailed_forecast: bool,
    order: Vec<String>,
    cards: HashMap<String, Card>,
    out: Box<dyn Write>,
}

impl TerminalDashboard {
    pub fn new(ui: &UiConfig, unit_symbol: &'static str, cities: Vec<String>) -> Self {
        Self::with_output(ui, unit_symbol, cities, Box::new(std::io::stdout()))
    }

    /// Build a dashboard that draws to `out` instead of stdout
    pub fn with_output(
        ui: &UiConfig,
        unit_symbol: &'static str,
        cities: Vec<String>,
        out: Box<dyn Write>,
    ) -> Self {
        let cards_per_row = ui.cards_per_row.max(1) as usize;
        let cards = cities
            .iter()
            .map(|city| (city.clone(), Card::default()))
            .collect();

        Self {
            title: ui.window_title.clone(),
            unit_symbol,
            card_width: (ui.window_width as usize / cards_per_row).max(8),
            cards_per_row,
            show_detailed_forecast: ui.show_detailed_forecast,
            order: cities,
            cards,
            out,
        }
    }

    /// Clear the terminal and draw the current card grid
    pub fn redraw(&mut self) {
        let frame = self.render();
        let written = write!(self.out, "{}{}", CLEAR_SCREEN, frame).and_then(|_| self.out.flush());
        if let Err(e) = written {
            tracing::warn!("Failed to draw dashboard: {}", e);
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&"=".repeat(self.title.chars().count()));
        out.push_str("\n\n");

        if self.order.is_empty() {
            out.push_str("No cities available. Check the city catalog file.\n");
            return out;
        }

        for row in self.order.chunks(self.cards_per_row) {
            let columns: Vec<Vec<String>> = row.iter().map(|city| self.card_lines(city)).collect();
            let height = columns.iter().map(Vec::len).max().unwrap_or(0);

            for line in 0..height {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|lines| {
                        let text = lines.get(line).map(String::as_str).unwrap_or("");
                        format!(
                            "{:<width$}",
                            truncate(text, self.card_width - 2),
                            width = self.card_width
                        )
                    })
                    .collect();
                out.push_str(cells.concat().trim_end());
                out.push('\n');
            }
            out.push('\n');
        }

        out
    }

    fn card_lines(&self, city: &str) -> Vec<String> {
        let card = self.cards.get(city).cloned().unwrap_or_default();

        let mut lines = vec![
            city.to_uppercase(),
            match card.temperature {
                Some(t) => format!("{}°{}", t, self.unit_symbol),
                None => format!("--°{}", self.unit_symbol),
            },
            card.condition,
        ];

        if self.show_detailed_forecast && !card.forecast.is_empty() {
            lines.push(String::new());
            lines.extend(card.forecast.lines().map(str::to_string));
        }

        if let Some(updated) = card.updated {
            lines.push(format!("Updated {}", updated));
        }

        lines
    }
}

impl DisplaySurface for TerminalDashboard {
    fn cities(&self) -> Vec<String> {
        self.order.clone()
    }

    fn show(&mut self, city: &str, summary: &WeatherSummary) {
        let Some(card) = self.cards.get_mut(city) else {
            tracing::debug!("No card for {}, ignoring summary", city);
            return;
        };

        // A missing temperature leaves the last known reading on the card
        if summary.temperature.is_some() {
            card.temperature = summary.temperature;
        }
        card.condition = summary.condition.clone();
        card.forecast = summary.forecast.clone();
        card.updated = Some(
            summary
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M")
                .to_string(),
        );
        self.redraw();
    }

    fn cycle_complete(&mut self, cycle: u64) {
        tracing::debug!("Refresh cycle {} complete", cycle);
        self.redraw();
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wxboard_weather::{dispatch, PollerMessage};

    /// Terminal stand-in that keeps everything written to it
    #[derive(Clone, Default)]
    struct Screen(Rc<RefCell<Vec<u8>>>);

    impl Screen {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }

        fn clear(&self) {
            self.0.borrow_mut().clear();
        }
    }

    impl Write for Screen {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn ui() -> UiConfig {
        UiConfig {
            window_title: "US CITIES WEATHER APP".to_string(),
            window_width: 120,
            cards_per_row: 3,
            show_detailed_forecast: true,
        }
    }

    fn sunny(temperature: Option<i32>) -> WeatherSummary {
        WeatherSummary {
            temperature,
            condition: "Sunny".to_string(),
            forecast: "Today: 88°F, Sunny\nTonight: 70°F, Mostly Clear".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_cards_start_loading() {
        let dashboard = TerminalDashboard::new(&ui(), "F", vec!["Austin".to_string()]);
        let text = dashboard.render();
        assert!(text.starts_with("US CITIES WEATHER APP\n"));
        assert!(text.contains("AUSTIN"));
        assert!(text.contains("--°F"));
        assert!(text.contains(LOADING));
    }

    #[test]
    fn test_show_updates_card() {
        let mut dashboard = TerminalDashboard::new(&ui(), "F", vec!["Austin".to_string()]);
        dashboard.show("Austin", &sunny(Some(72)));

        let text = dashboard.render();
        assert!(text.contains("72°F"));
        assert!(text.contains("Sunny"));
        assert!(text.contains("Tonight: 70°F, Mostly Clear"));
        assert!(text.contains("Updated "));
        assert!(!text.contains(LOADING));
    }

    #[test]
    fn test_error_keeps_last_temperature() {
        let mut dashboard = TerminalDashboard::new(&ui(), "F", vec!["Austin".to_string()]);
        dashboard.show("Austin", &sunny(Some(72)));
        dashboard.show(
            "Austin",
            &WeatherSummary::error(wxboard_weather::ERROR_NO_INTERNET),
        );

        let text = dashboard.render();
        assert!(text.contains("72°F"));
        assert!(text.contains("Error"));
        assert!(text.contains("Unable to connect"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut dashboard = TerminalDashboard::new(&ui(), "F", vec!["Austin".to_string()]);
        dashboard.show("Austin", &sunny(Some(72)));
        dashboard.show("Austin", &sunny(Some(65)));

        let text = dashboard.render();
        assert!(text.contains("65°F"));
        assert!(!text.contains("72°F"));
    }

    #[test]
    fn test_grid_wraps_after_cards_per_row() {
        let cities: Vec<String> = ["Austin", "Boston", "Chicago", "Denver"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let dashboard = TerminalDashboard::new(&ui(), "F", cities);
        let text = dashboard.render();

        let first_row = text.lines().find(|l| l.contains("AUSTIN")).unwrap();
        assert!(first_row.contains("BOSTON"));
        assert!(first_row.contains("CHICAGO"));
        assert!(!first_row.contains("DENVER"));
        assert!(text.lines().any(|l| l.trim() == "DENVER"));
    }

    #[test]
    fn test_detailed_forecast_can_be_hidden() {
        let mut config = ui();
        config.show_detailed_forecast = false;
        let mut dashboard = TerminalDashboard::new(&config, "F", vec!["Austin".to_string()]);
        dashboard.show("Austin", &sunny(Some(72)));

        let text = dashboard.render();
        assert!(text.contains("72°F"));
        assert!(!text.contains("Tonight"));
    }

    #[test]
    fn test_unknown_city_is_ignored() {
        let mut dashboard = TerminalDashboard::new(&ui(), "F", vec!["Austin".to_string()]);
        dashboard.show("Atlantis", &sunny(Some(90)));
        assert!(!dashboard.render().contains("ATLANTIS"));
    }

    #[test]
    fn test_empty_catalog_message() {
        let dashboard = TerminalDashboard::new(&ui(), "F", Vec::new());
        assert!(dashboard.render().contains("No cities available"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Sunny", 10), "Sunny");
        assert_eq!(truncate("Chance Showers", 8), "Chance …");
    }

    #[test]
    fn test_summary_is_drawn_before_cycle_completes() {
        let screen = Screen::default();
        let cities = vec!["Austin".to_string(), "Boston".to_string()];
        let mut dashboard =
            TerminalDashboard::with_output(&ui(), "F", cities, Box::new(screen.clone()));

        dispatch(
            &mut dashboard,
            &PollerMessage::Summary {
                city: "Austin".to_string(),
                summary: sunny(Some(72)),
            },
        );

        let drawn = screen.contents();
        assert!(drawn.starts_with(CLEAR_SCREEN));
        assert!(drawn.contains("72°F"));
        assert!(drawn.contains(LOADING));

        screen.clear();
        dispatch(
            &mut dashboard,
            &PollerMessage::CycleComplete {
                cycle: 1,
                cities: 2,
            },
        );
        assert!(screen.contents().contains("72°F"));
    }

    #[test]
    fn test_unknown_city_does_not_redraw() {
        let screen = Screen::default();
        let mut dashboard = TerminalDashboard::with_output(
            &ui(),
            "F",
            vec!["Austin".to_string()],
            Box::new(screen.clone()),
        );
        dashboard.show("Atlantis", &sunny(Some(90)));
        assert!(screen.contents().is_empty());
    }
}
