use std::time::Duration;

use log::debug;
use teloxide::types::UserId;

use crate::{
    collector::{Collector, CollectorOptions},
    error::GameResult,
    events::Event,
    surface::{Control, Prompt},
    table::Table,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageAction {
    First,
    Back,
    Next,
    Last,
    Dismiss,
}

impl PageAction {
    pub const ALL: [PageAction; 5] = [
        PageAction::First,
        PageAction::Back,
        PageAction::Next,
        PageAction::Last,
        PageAction::Dismiss,
    ];

    pub fn data(self) -> &'static str {
        match self {
            PageAction::First => "page:first",
            PageAction::Back => "page:back",
            PageAction::Next => "page:next",
            PageAction::Last => "page:last",
            PageAction::Dismiss => "page:dismiss",
        }
    }

    fn label(self) -> &'static str {
        match self {
            PageAction::First => "⏮",
            PageAction::Back => "◀",
            PageAction::Next => "▶",
            PageAction::Last => "⏭",
            PageAction::Dismiss => "🗑",
        }
    }

    pub fn from_data(data: &str) -> Option<PageAction> {
        PageAction::ALL.into_iter().find(|action| action.data() == data)
    }
}

/// A 1-indexed page cursor over a list. Navigation clamps at both ends.
#[derive(Clone, Debug)]
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
    current_page: usize,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Paginator<T> {
        Paginator {
            items,
            per_page: per_page.max(1),
            current_page: 1,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn total_pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    /// Moves the cursor. Returns whether the page changed.
    pub fn navigate(&mut self, action: PageAction) -> bool {
        let page = match action {
            PageAction::First => 1,
            PageAction::Back => self.current_page.saturating_sub(1).max(1),
            PageAction::Next => (self.current_page + 1).min(self.last_page()),
            PageAction::Last => self.last_page(),
            PageAction::Dismiss => self.current_page,
        };
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    /// Swaps the backing list and goes back to page 1.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = 1;
    }

    /// Items on the current page. The last page may be short.
    pub fn window(&self) -> &[T] {
        let start = ((self.current_page - 1) * self.per_page).min(self.items.len());
        let end = (start + self.per_page).min(self.items.len());
        &self.items[start..end]
    }
}

/// A paginated message driven by its owner's button presses.
pub struct PaginatedView<T> {
    title: String,
    paginator: Paginator<T>,
    owner: UserId,
    time_limit: Duration,
    selectors: Vec<Control>,
}

impl<T> PaginatedView<T> {
    pub fn new(title: impl Into<String>, paginator: Paginator<T>, owner: UserId, time_limit: Duration) -> Self {
        PaginatedView {
            title: title.into(),
            paginator,
            owner,
            time_limit,
            selectors: Vec::new(),
        }
    }

    /// Extra buttons shown above the navigation row, handled by the
    /// `select` callback of [`PaginatedView::run`].
    pub fn with_selectors(mut self, selectors: Vec<Control>) -> Self {
        self.selectors = selectors;
        self
    }

    fn render<R>(&self, format: &R) -> Prompt
    where
        R: Fn(&T) -> String,
    {
        let body = if self.paginator.window().is_empty() {
            String::from("Nothing to show.")
        } else {
            self.paginator.window().iter().map(format).collect::<Vec<_>>().join("\n")
        };
        let text = format!(
            "{}\n\n{}\n\nPage {} of {}",
            self.title,
            body,
            self.paginator.current_page(),
            self.paginator.last_page()
        );

        Prompt::new(text)
            .with_row(self.selectors.clone())
            .with_row(
                PageAction::ALL
                    .into_iter()
                    .map(|action| Control::new(action.label(), action.data()))
                    .collect(),
            )
    }

    /// Shows the view until it is dismissed or left alone for the time
    /// limit, then deletes the message. Every accepted press restarts the
    /// timer. Presses on selector buttons go to `select`, which may return
    /// a replacement list.
    pub async fn run<R, S>(mut self, table: &Table, format: R, mut select: S) -> GameResult<()>
    where
        R: Fn(&T) -> String,
        S: FnMut(&str) -> Option<Vec<T>>,
    {
        let message = table.render(None, &self.render(&format)).await?;
        let owner = self.owner;
        let mut collector = Collector::new(
            &table.hub,
            table.chat_id,
            move |event: &Event| event.is_on(message) && event.user().user_id == owner,
            CollectorOptions::new(self.time_limit).reset_on_collect(),
        );

        while let Some(event) = collector.next().await {
            let Some(data) = event.button_data() else {
                continue;
            };
            match PageAction::from_data(data) {
                Some(PageAction::Dismiss) => break,
                Some(action) => {
                    if !self.paginator.navigate(action) {
                        continue;
                    }
                }
                None => match select(data) {
                    Some(items) => self.paginator.replace_items(items),
                    None => continue,
                },
            }
            table.render(Some(message), &self.render(&format)).await?;
        }

        debug!("Closing paginated view {} in chat {}", message, table.chat_id);
        table.dismiss(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{button, identity, table, until_listening, RecordingSurface, CHAT};
    use teloxide::types::MessageId;

    fn numbers(count: usize) -> Vec<usize> {
        (1..=count).collect()
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut pages = Paginator::new(numbers(23), 10);
        assert_eq!(pages.total_pages(), 3);

        pages.navigate(PageAction::Next);
        assert_eq!(pages.current_page(), 2);

        let walk: Vec<usize> = [PageAction::First, PageAction::Back, PageAction::Next, PageAction::Last]
            .into_iter()
            .map(|action| {
                pages.navigate(action);
                pages.current_page()
            })
            .collect();
        assert_eq!(walk, vec![1, 1, 2, 3]);

        assert!(!pages.navigate(PageAction::Next));
        assert_eq!(pages.current_page(), 3);

        pages.navigate(PageAction::First);
        assert!(!pages.navigate(PageAction::Back));
        assert_eq!(pages.current_page(), 1);
    }

    #[test]
    fn window_truncates_last_page() {
        let mut pages = Paginator::new(numbers(23), 10);
        assert_eq!(pages.window(), &numbers(10)[..]);
        pages.navigate(PageAction::Last);
        assert_eq!(pages.window(), &[21, 22, 23]);
    }

    #[test]
    fn empty_list_still_has_one_page() {
        let mut pages = Paginator::new(Vec::<usize>::new(), 5);
        assert_eq!(pages.total_pages(), 0);
        assert_eq!(pages.last_page(), 1);
        assert!(!pages.navigate(PageAction::Last));
        assert_eq!(pages.current_page(), 1);
        assert!(pages.window().is_empty());
    }

    #[test]
    fn replacing_items_resets_to_first_page() {
        let mut pages = Paginator::new(numbers(23), 10);
        pages.navigate(PageAction::Last);
        assert_eq!(pages.current_page(), 3);

        pages.replace_items(numbers(45));
        assert_eq!(pages.current_page(), 1);
        assert_eq!(pages.total_pages(), 5);
    }

    #[test]
    fn actions_round_trip_through_button_data() {
        for action in PageAction::ALL {
            assert_eq!(PageAction::from_data(action.data()), Some(action));
        }
        assert_eq!(PageAction::from_data("help:games"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn only_owner_drives_the_view() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let view = PaginatedView::new("Numbers", Paginator::new(numbers(23), 10), identity(1, "me").user_id, Duration::from_secs(25))
            .with_selectors(vec![Control::new("Evens", "filter:evens")]);
        let task = tokio::spawn({
            let table = table.clone();
            async move {
                view.run(&table, |n| n.to_string(), |data| {
                    (data == "filter:evens").then(|| (2..=30).step_by(2).collect())
                })
                .await
            }
        });
        until_listening(&hub, CHAT).await;

        hub.publish(CHAT, button(identity(2, "other"), 1, PageAction::Next.data()));
        hub.publish(CHAT, button(identity(1, "me"), 1, PageAction::Last.data()));
        hub.publish(CHAT, button(identity(1, "me"), 1, PageAction::Next.data()));
        hub.publish(CHAT, button(identity(1, "me"), 1, "filter:evens"));
        hub.publish(CHAT, button(identity(1, "me"), 1, PageAction::Dismiss.data()));
        task.await.unwrap().unwrap();

        let texts: Vec<String> = surface.renders().into_iter().map(|r| r.prompt.text).collect();
        assert_eq!(texts.len(), 3);
        assert!(texts[0].ends_with("Page 1 of 3"));
        assert!(texts[1].ends_with("Page 3 of 3"));
        assert!(texts[2].ends_with("Page 1 of 2"));
        assert!(surface.renders()[0].prompt.has_control("filter:evens"));
        assert_eq!(surface.dismissed(), vec![MessageId(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_view_is_dismissed() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let view = PaginatedView::new("Numbers", Paginator::new(numbers(3), 10), identity(1, "me").user_id, Duration::from_secs(25));

        let started = tokio::time::Instant::now();
        view.run(&table, |n| n.to_string(), |_| None).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(25));
        assert_eq!(surface.dismissed(), vec![MessageId(1)]);
    }
}
