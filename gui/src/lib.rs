use std::sync::Arc;

use analytics::{overall_tally, sentiment_price_series};
use charts::{sentiment_pie, sentiment_price_chart, DivergingChart, PieChart};
use iced::widget::{
    button, column, container, pick_list, row, scrollable, text, text_input, Column,
};
use iced::{Command, Element, Length, Theme};
use marketpulse_core::{AppConfig, ErrorExt, Post, SortKey};
use price_client::PriceClient;
use search_client::{attach_comments, sort_posts, FanoutReport, SearchClient};
use tracing::info;

mod render;

use render::{DivergingView, SentimentMixView};

/// How many result cards are rendered at once.
pub const DISPLAY_COUNT: usize = 20;

const YEAR_MIN: i32 = 2013;
const YEAR_MAX: i32 = 2025;

/// Sort options offered in the UI. `Relevance` keeps the engine's ranking
/// and therefore never re-sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortChoice {
    Relevance,
    Score,
    Comments,
    Date,
}

impl SortChoice {
    pub const ALL: [SortChoice; 4] = [
        SortChoice::Relevance,
        SortChoice::Score,
        SortChoice::Comments,
        SortChoice::Date,
    ];

    pub fn key(self) -> Option<SortKey> {
        match self {
            SortChoice::Relevance => None,
            SortChoice::Score => Some(SortKey::Score),
            SortChoice::Comments => Some(SortKey::Comments),
            SortChoice::Date => Some(SortKey::Date),
        }
    }
}

impl std::fmt::Display for SortChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SortChoice::Relevance => "Relevance",
            SortChoice::Score => "Post Score",
            SortChoice::Comments => "Comments",
            SortChoice::Date => "Date Posted",
        };
        write!(f, "{label}")
    }
}

/// Everything a finished search hands back to the UI thread.
#[derive(Debug, Clone)]
pub struct SearchOutput {
    pub posts: Vec<Post>,
    pub fanout: FanoutReport,
    pub pie: PieChart,
    pub chart: Option<DivergingChart>,
}

/// Explicit search outcome so the view can tell "no matches" apart from
/// "engine unavailable" instead of silently not updating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    NoMatches,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Message {
    QueryChanged(String),
    TickerChanged(String),
    StartYearPicked(i32),
    EndYearPicked(i32),
    SortPicked(SortChoice),
    DirectionToggled,
    SearchPressed,
    SearchFinished(Result<SearchOutput, String>),
}

/// Construction-time dependencies, injected by the binary at startup.
pub struct Flags {
    pub config: AppConfig,
    pub search: Arc<SearchClient>,
    pub prices: Arc<PriceClient>,
}

pub struct App {
    config: AppConfig,
    search: Arc<SearchClient>,
    prices: Arc<PriceClient>,

    query: String,
    ticker: String,
    start_year: i32,
    end_year: i32,
    sort_by: SortChoice,
    ascending: bool,

    state: SearchState,
    results: Vec<Post>,
    fanout: FanoutReport,
    pie: Option<PieChart>,
    chart: Option<DivergingChart>,
}

impl App {
    pub fn new(flags: Flags) -> Self {
        Self {
            config: flags.config,
            search: flags.search,
            prices: flags.prices,
            query: String::new(),
            ticker: String::new(),
            start_year: YEAR_MIN,
            end_year: YEAR_MAX,
            sort_by: SortChoice::Relevance,
            ascending: false,
            state: SearchState::Idle,
            results: Vec::new(),
            fanout: FanoutReport::default(),
            pie: None,
            chart: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::QueryChanged(query) => {
                self.query = query;
                Command::none()
            }
            Message::TickerChanged(ticker) => {
                self.ticker = ticker;
                Command::none()
            }
            Message::StartYearPicked(year) => {
                self.start_year = year;
                if self.end_year < year {
                    self.end_year = year;
                }
                Command::none()
            }
            Message::EndYearPicked(year) => {
                self.end_year = year;
                Command::none()
            }
            Message::SortPicked(choice) => {
                self.sort_by = choice;
                self.apply_sort();
                Command::none()
            }
            Message::DirectionToggled => {
                self.ascending = !self.ascending;
                self.apply_sort();
                Command::none()
            }
            Message::SearchPressed => {
                if self.state == SearchState::Searching {
                    return Command::none();
                }
                self.state = SearchState::Searching;
                info!("Searching for {:?} ({}..={})", self.query, self.start_year, self.end_year);

                let task = run_search(
                    Arc::clone(&self.search),
                    Arc::clone(&self.prices),
                    self.query.clone(),
                    self.ticker.clone(),
                    self.start_year,
                    self.end_year,
                    self.config.top_k,
                    self.config.fanout_workers(),
                );
                Command::perform(task, Message::SearchFinished)
            }
            Message::SearchFinished(Ok(output)) => {
                self.state = if output.posts.is_empty() {
                    SearchState::NoMatches
                } else {
                    SearchState::Ready
                };
                self.results = output.posts;
                self.fanout = output.fanout;
                self.pie = Some(output.pie);
                self.chart = output.chart;
                self.apply_sort();
                Command::none()
            }
            Message::SearchFinished(Err(message)) => {
                self.state = SearchState::Failed(message);
                Command::none()
            }
        }
    }

    fn apply_sort(&mut self) {
        if let Some(key) = self.sort_by.key() {
            sort_posts(&mut self.results, key, self.ascending);
        }
    }

    pub fn view(&self) -> Element<Message, Theme> {
        let title: Element<Message, Theme> = text("Stock Sentiment Dashboard").size(24).into();

        let controls = self.view_controls();
        let charts_area = self.view_charts();
        let results = self.view_results();

        let main_content: Element<Message, Theme> =
            column![title, controls, charts_area, results]
                .spacing(16)
                .into();

        container(main_content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into()
    }

    fn view_controls(&self) -> Element<Message, Theme> {
        let start_years: Vec<i32> = (YEAR_MIN..=YEAR_MAX).collect();
        let end_years: Vec<i32> = (self.start_year..=YEAR_MAX).collect();

        let search_button = if self.state == SearchState::Searching {
            button(text("Searching..."))
        } else {
            button(text("Search")).on_press(Message::SearchPressed)
        };

        let direction_label = if self.ascending { "Asc" } else { "Desc" };

        row![
            text_input("Query", &self.query)
                .on_input(Message::QueryChanged)
                .width(Length::FillPortion(3)),
            text_input("Stock ticker", &self.ticker)
                .on_input(Message::TickerChanged)
                .width(Length::FillPortion(1)),
            pick_list(start_years, Some(self.start_year), Message::StartYearPicked),
            pick_list(end_years, Some(self.end_year), Message::EndYearPicked),
            pick_list(&SortChoice::ALL[..], Some(self.sort_by), Message::SortPicked),
            button(text(direction_label)).on_press(Message::DirectionToggled),
            search_button,
        ]
        .spacing(10)
        .into()
    }

    fn view_charts(&self) -> Element<Message, Theme> {
        let Some(pie) = &self.pie else {
            return column![].into();
        };

        let mix: Element<Message, Theme> =
            iced::widget::Canvas::new(SentimentMixView::new(pie.clone()))
                .width(Length::Fill)
                .height(Length::Fixed(90.0))
                .into();

        let content: Element<Message, Theme> = match &self.chart {
            Some(chart) => {
                let diverging: Element<Message, Theme> =
                    iced::widget::Canvas::new(DivergingView::new(chart.clone()))
                        .width(Length::Fill)
                        .height(Length::Fixed(280.0))
                        .into();
                row![
                    container(diverging).width(Length::FillPortion(2)),
                    container(mix).width(Length::FillPortion(1)),
                ]
                .spacing(16)
                .into()
            }
            None => mix,
        };

        container(content).padding(10).into()
    }

    fn view_results(&self) -> Element<Message, Theme> {
        let status: Element<Message, Theme> = match &self.state {
            SearchState::Idle => text("Enter a query to search the corpus").size(14).into(),
            SearchState::Searching => text("Searching...").size(14).into(),
            SearchState::NoMatches => text("No matching posts").size(14).into(),
            SearchState::Failed(message) => text(format!("Search failed: {message}"))
                .size(14)
                .style(iced::theme::Text::Color(iced::Color::from_rgb(
                    0.8, 0.16, 0.13,
                )))
                .into(),
            SearchState::Ready => text(format!(
                "Displaying {} of {} results",
                self.results.len().min(DISPLAY_COUNT),
                self.results.len()
            ))
            .size(14)
            .into(),
        };

        let mut listing = Column::new().spacing(10).push(status);

        if self.fanout.failures > 0 {
            listing = listing.push(
                text(format!(
                    "Comments unavailable for {} of {} posts",
                    self.fanout.failures, self.fanout.attempted
                ))
                .size(12),
            );
        }

        for post in self.results.iter().take(DISPLAY_COUNT) {
            let card: Element<Message, Theme> = container(
                column![
                    text(&post.title).size(16),
                    text(format!(
                        "Posted: {} | Score: {:.0} | Comments: {}",
                        post.date.format("%Y-%m-%d"),
                        post.score,
                        post.num_comments
                    ))
                    .size(12),
                    text(&post.text).size(14),
                ]
                .spacing(5),
            )
            .padding(10)
            .width(Length::Fill)
            .into();
            listing = listing.push(card);
        }

        scrollable(listing).height(Length::Fill).into()
    }
}

async fn run_search(
    search: Arc<SearchClient>,
    prices: Arc<PriceClient>,
    query: String,
    ticker: String,
    start_year: i32,
    end_year: i32,
    top_k: usize,
    workers: usize,
) -> Result<SearchOutput, String> {
    let posts = search
        .query_posts(&query, Some(start_year), Some(end_year), top_k)
        .await
        .map_err(|e| {
            e.log_error();
            e.user_friendly_message()
        })?;

    let (posts, fanout) = attach_comments(Arc::clone(&search), posts, workers).await;

    let chart = if posts.is_empty() {
        None
    } else {
        let series = sentiment_price_series(&posts, &ticker, start_year, end_year, &prices).await;
        Some(sentiment_price_chart(&series, &ticker))
    };
    let pie = sentiment_pie(&overall_tally(&posts));

    Ok(SearchOutput {
        posts,
        fanout,
        pie,
        chart,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_core::SentimentTally;

    fn test_app() -> App {
        let config = AppConfig {
            search_url: "http://localhost:7700".to_string(),
            price_url: "http://localhost:9000".to_string(),
            fanout_workers: Some(2),
            top_k: 100,
        };
        let search = Arc::new(SearchClient::new(&config).unwrap());
        let prices = Arc::new(PriceClient::new(&config).unwrap());
        App::new(Flags {
            config,
            search,
            prices,
        })
    }

    fn finished(posts: Vec<Post>) -> Message {
        let pie = sentiment_pie(&overall_tally(&posts));
        Message::SearchFinished(Ok(SearchOutput {
            posts,
            fanout: FanoutReport::default(),
            pie,
            chart: None,
        }))
    }

    fn fixture_post(id: &str, score: f64) -> Post {
        Post {
            id: id.to_string(),
            title: format!("post {id}"),
            text: String::new(),
            date: chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            score,
            url: String::new(),
            upvotes: 0,
            downvotes: 0,
            num_comments: 0,
            tickers: Vec::new(),
            sentiment: SentimentTally::default(),
            comment_ids: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_sort_choice_labels() {
        assert_eq!(SortChoice::Relevance.to_string(), "Relevance");
        assert_eq!(SortChoice::Score.to_string(), "Post Score");
        assert!(SortChoice::Relevance.key().is_none());
        assert_eq!(SortChoice::Date.key(), Some(SortKey::Date));
    }

    #[test]
    fn test_empty_result_set_reports_no_matches() {
        let mut app = test_app();
        let _ = app.update(finished(Vec::new()));
        assert_eq!(app.state, SearchState::NoMatches);
        assert!(app.pie.is_some());
    }

    #[test]
    fn test_results_replace_session_state_and_respect_sort() {
        let mut app = test_app();
        app.sort_by = SortChoice::Score;

        let _ = app.update(finished(vec![fixture_post("low", 1.0), fixture_post("high", 9.0)]));
        assert_eq!(app.state, SearchState::Ready);
        assert_eq!(app.results[0].id, "high");

        // A later search replaces the set wholesale.
        let _ = app.update(finished(vec![fixture_post("only", 5.0)]));
        assert_eq!(app.results.len(), 1);
    }

    #[test]
    fn test_failure_surfaces_message() {
        let mut app = test_app();
        let _ = app.update(Message::SearchFinished(Err("engine down".to_string())));
        assert_eq!(app.state, SearchState::Failed("engine down".to_string()));
    }

    #[test]
    fn test_start_year_clamps_end_year() {
        let mut app = test_app();
        let _ = app.update(Message::EndYearPicked(2015));
        let _ = app.update(Message::StartYearPicked(2020));
        assert_eq!(app.end_year, 2020);
    }
}
