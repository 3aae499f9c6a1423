use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use teloxide::types::UserId;

use crate::{
    collector::{CollectorOptions, Flow},
    error::GameResult,
    events::Event,
    lobby::LobbyBounds,
    session::{Game, Negotiation, Round, Session},
    surface::{Control, Prompt, Status},
};

const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(word: &str) -> Option<Difficulty> {
        match word.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    TrueFalse,
    Multiple,
}

#[derive(Clone, Debug)]
pub struct Question {
    pub category: String,
    pub text: String,
    pub correct: String,
    pub incorrect: Vec<String>,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
}

impl Question {
    pub fn points(&self) -> u32 {
        match (self.kind, self.difficulty) {
            (QuestionKind::TrueFalse, _) => 1,
            (QuestionKind::Multiple, Difficulty::Easy) => 1,
            (QuestionKind::Multiple, Difficulty::Medium) => 2,
            (QuestionKind::Multiple, Difficulty::Hard) => 3,
        }
    }
}

/// Where questions come from.
pub trait QuestionSource: Send + Sync {
    /// Up to `amount` questions, of `difficulty` when one is given. Fewer
    /// means the source ran dry.
    fn fetch(&mut self, amount: usize, difficulty: Option<Difficulty>) -> GameResult<Vec<Question>>;
}

fn question(
    category: &str,
    text: &str,
    correct: &str,
    incorrect: &[&str],
    difficulty: Difficulty,
) -> Question {
    Question {
        category: category.to_string(),
        text: text.to_string(),
        correct: correct.to_string(),
        incorrect: incorrect.iter().map(|s| s.to_string()).collect(),
        difficulty,
        kind: if incorrect.len() == 1 {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::Multiple
        },
    }
}

/// A small bundled question bank, served in random order.
pub struct BuiltinQuestions;

impl BuiltinQuestions {
    pub fn bank() -> Vec<Question> {
        use Difficulty::*;
        vec![
            question("Science", "What is the chemical symbol for gold?", "Au", &["Ag", "Gd", "Go"], Easy),
            question("Science", "Sound travels faster in water than in air.", "True", &["False"], Easy),
            question("Science", "Which planet has the most moons?", "Saturn", &["Jupiter", "Uranus", "Neptune"], Medium),
            question("Science", "What is the hardest natural substance?", "Diamond", &["Quartz", "Topaz", "Corundum"], Easy),
            question("Geography", "What is the capital of Australia?", "Canberra", &["Sydney", "Melbourne", "Perth"], Medium),
            question("Geography", "Mount Kilimanjaro is in Kenya.", "False", &["True"], Medium),
            question("Geography", "Which river flows through Baghdad?", "Tigris", &["Euphrates", "Jordan", "Nile"], Hard),
            question("History", "In which year did the Berlin Wall fall?", "1989", &["1987", "1991", "1993"], Easy),
            question("History", "Which empire built Machu Picchu?", "Inca", &["Aztec", "Maya", "Olmec"], Medium),
            question("History", "Who was the first emperor of Rome?", "Augustus", &["Julius Caesar", "Nero", "Tiberius"], Medium),
            question("Computers", "Rust was first released as 1.0 in 2015.", "True", &["False"], Easy),
            question("Computers", "What does CPU stand for?", "Central Processing Unit", &["Central Program Utility", "Computer Personal Unit", "Core Processing Utility"], Easy),
            question("Computers", "Which sorting algorithm has the best average time on random data?", "Quicksort", &["Bubble sort", "Insertion sort", "Selection sort"], Hard),
            question("Animals", "How many hearts does an octopus have?", "3", &["1", "2", "4"], Medium),
            question("Animals", "A group of crows is called a murder.", "True", &["False"], Easy),
            question("Animals", "What is the fastest land animal?", "Cheetah", &["Pronghorn", "Lion", "Greyhound"], Easy),
            question("Art", "Who painted The Persistence of Memory?", "Salvador Dali", &["Rene Magritte", "Pablo Picasso", "Joan Miro"], Hard),
            question("Music", "How many keys does a standard piano have?", "88", &["76", "84", "96"], Medium),
        ]
    }
}

impl QuestionSource for BuiltinQuestions {
    fn fetch(&mut self, amount: usize, difficulty: Option<Difficulty>) -> GameResult<Vec<Question>> {
        let mut bank = BuiltinQuestions::bank();
        if let Some(difficulty) = difficulty {
            bank.retain(|q| q.difficulty == difficulty);
        }
        bank.shuffle(&mut rand::thread_rng());
        bank.truncate(amount);
        Ok(bank)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TriviaOptions {
    pub rounds: usize,
    pub bounds: LobbyBounds,
    pub difficulty: Option<Difficulty>,
    pub round_time: Duration,
    pub pause: Duration,
}

impl Default for TriviaOptions {
    fn default() -> Self {
        TriviaOptions {
            rounds: 1,
            bounds: LobbyBounds::new(2, 4),
            difficulty: None,
            round_time: Duration::from_secs(20),
            pause: Duration::from_secs(5),
        }
    }
}

impl TriviaOptions {
    /// Out of range values are clamped. A `min` above `max` is kept and
    /// reported when the game starts.
    pub fn new(
        rounds: Option<u64>,
        min: Option<u64>,
        max: Option<u64>,
        round_secs: Option<u64>,
        pause_secs: Option<u64>,
    ) -> TriviaOptions {
        let defaults = TriviaOptions::default();
        let min = min.map_or(defaults.bounds.min, |m| m.clamp(1, 10) as usize);
        let max = max.map_or(defaults.bounds.max, |m| m.clamp(1, 10) as usize);
        TriviaOptions {
            rounds: rounds.map_or(defaults.rounds, |r| r.clamp(1, 10) as usize),
            bounds: LobbyBounds::new(min, max),
            difficulty: None,
            round_time: round_secs.map_or(defaults.round_time, |s| Duration::from_secs(s.clamp(5, 60))),
            pause: pause_secs.map_or(defaults.pause, |s| Duration::from_secs(s.clamp(3, 15))),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> TriviaOptions {
        self.difficulty = difficulty;
        self
    }
}

/// A question with its answers in display order.
struct Asked {
    question: Question,
    answers: Vec<String>,
    correct: usize,
}

impl Asked {
    fn new(question: Question) -> Asked {
        let mut answers: Vec<String> = question.incorrect.clone();
        answers.push(question.correct.clone());
        match question.kind {
            // Keep True before False.
            QuestionKind::TrueFalse => answers.sort_by(|a, b| b.cmp(a)),
            QuestionKind::Multiple => answers.shuffle(&mut rand::thread_rng()),
        }
        let correct = answers.iter().position(|a| *a == question.correct).unwrap_or(0);
        Asked {
            question,
            answers,
            correct,
        }
    }

    fn letter(index: usize) -> char {
        LETTERS.get(index).copied().unwrap_or('?')
    }

    fn data(index: usize) -> String {
        format!("trivia:{}", Asked::letter(index))
    }

    fn answer_from(&self, data: &str) -> Option<usize> {
        (0..self.answers.len()).find(|i| Asked::data(*i) == data)
    }
}

struct Scorer {
    user_id: UserId,
    name: String,
    score: u32,
    answer: Option<usize>,
}

pub struct Trivia {
    options: TriviaOptions,
    source: Box<dyn QuestionSource>,
    questions: Vec<Asked>,
    current: usize,
    scorers: Vec<Scorer>,
    log: String,
}

impl Trivia {
    pub fn new(options: TriviaOptions, source: Box<dyn QuestionSource>) -> Trivia {
        Trivia {
            options,
            source,
            questions: Vec::new(),
            current: 0,
            scorers: Vec::new(),
            log: String::new(),
        }
    }

    fn standings(&self, status: Status, title: &str) -> Prompt {
        let mut ranked: Vec<&Scorer> = self.scorers.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        let mut lines = vec![format!("{status} {title}"), String::new()];
        for scorer in ranked {
            let answer = scorer.answer.map_or('-', Asked::letter);
            lines.push(format!("{} ({}): {}", scorer.name, answer, scorer.score));
        }
        if !self.log.is_empty() {
            lines.push(String::new());
            lines.push(self.log.clone());
        }
        Prompt::new(lines.join("\n"))
    }
}

#[async_trait]
impl Game for Trivia {
    type Input = HashMap<UserId, usize>;

    fn name(&self) -> &'static str {
        "Trivia"
    }

    fn negotiation(&self) -> Negotiation {
        Negotiation::Lobby(self.options.bounds)
    }

    async fn initialize(&mut self, session: &mut Session) -> GameResult<()> {
        let bounds = self.options.bounds;
        if !bounds.is_consistent() {
            session
                .notify(&format!(
                    "The minimum number of players ({}) cannot be more than the maximum ({}).",
                    bounds.min, bounds.max
                ))
                .await?;
            session.end();
            return Ok(());
        }

        let questions = self.source.fetch(self.options.rounds, self.options.difficulty)?;
        if questions.len() < self.options.rounds {
            session
                .notify("There are not enough trivia questions right now, try fewer rounds.")
                .await?;
            session.end();
            return Ok(());
        }

        self.questions = questions.into_iter().map(Asked::new).collect();
        self.scorers = session
            .players()
            .map(|p| Scorer {
                user_id: p.user_id(),
                name: p.name().to_string(),
                score: 0,
                answer: None,
            })
            .collect();
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.current >= self.questions.len()
    }

    async fn render(&mut self, session: &mut Session) -> GameResult<()> {
        let Some(asked) = self.questions.get(self.current) else {
            return Ok(());
        };
        let question = &asked.question;

        let mut lines = vec![
            format!(
                "{} Question {}/{}",
                session.status(),
                self.current + 1,
                self.questions.len()
            ),
            format!(
                "{} - {:?} | {} point(s)",
                question.category,
                question.difficulty,
                question.points()
            ),
            String::new(),
            question.text.clone(),
            String::new(),
        ];
        for (i, answer) in asked.answers.iter().enumerate() {
            lines.push(format!("{}: {}", Asked::letter(i), answer));
        }
        lines.push(String::new());
        lines.push(format!("You have {} seconds to answer.", session.time_limit().as_secs()));

        let buttons = (0..asked.answers.len())
            .map(|i| Control::new(Asked::letter(i).to_string(), Asked::data(i)))
            .collect();
        let prompt = Prompt::new(lines.join("\n")).with_row(buttons);
        session.render(&prompt).await?;
        Ok(())
    }

    async fn await_round(&mut self, session: &mut Session) -> GameResult<Round<HashMap<UserId, usize>>> {
        let (Some(message), Some(asked)) = (session.message(), self.questions.get(self.current)) else {
            return Ok(Round::Inactive);
        };
        let ids: Vec<UserId> = self.scorers.iter().map(|s| s.user_id).collect();
        let data: Vec<String> = (0..asked.answers.len()).map(Asked::data).collect();
        let filter_ids = ids.clone();
        let collector = session.collector(
            move |event: &Event| {
                event.is_on(message)
                    && filter_ids.contains(&event.user().user_id)
                    && event.button_data().map_or(false, |d| data.iter().any(|x| x == d))
            },
            CollectorOptions::new(session.time_limit()),
        );

        // Last click counts.
        let mut answers = HashMap::new();
        let collected = collector
            .collect(|event| {
                if let Some(answer) = event.button_data().and_then(|d| asked.answer_from(d)) {
                    answers.insert(event.user().user_id, answer);
                }
                if ids.iter().all(|id| answers.contains_key(id)) {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            })
            .await;

        if collected.is_inactive() {
            Ok(Round::Inactive)
        } else {
            Ok(Round::Input(answers))
        }
    }

    async fn apply(&mut self, session: &mut Session, answers: HashMap<UserId, usize>) -> GameResult<()> {
        let Some(asked) = self.questions.get(self.current) else {
            return Ok(());
        };
        let points = asked.question.points();

        let mut correct = Vec::new();
        for scorer in self.scorers.iter_mut() {
            scorer.answer = answers.get(&scorer.user_id).copied();
            if scorer.answer == Some(asked.correct) {
                scorer.score += points;
                correct.push(scorer.name.clone());
            }
        }

        let reveal = format!(
            "Question: {}\nAnswer: {} ({})",
            asked.question.text,
            asked.question.correct,
            Asked::letter(asked.correct)
        );
        self.log = if correct.is_empty() {
            format!("Nobody got it right!\n\n{reveal}")
        } else {
            format!("{} got it right!\n\n{reveal}", correct.join(", "))
        };
        self.current += 1;

        let title = format!("Scores | Turn {}/{}", self.current, self.questions.len());
        let prompt = self.standings(Status::Secondary, &title);
        session.render(&prompt).await?;
        Ok(())
    }

    fn intermediate(&self) -> Option<Duration> {
        Some(self.options.pause)
    }

    async fn finish(&mut self, session: &mut Session) -> GameResult<()> {
        session.set_status(Status::Success);
        let best = self.scorers.iter().map(|s| s.score).max().unwrap_or(0);
        let winners: Vec<&str> = self
            .scorers
            .iter()
            .filter(|s| s.score == best && best > 0)
            .map(|s| s.name.as_str())
            .collect();
        let title = if winners.is_empty() {
            String::from("Final scores | Nobody scored")
        } else {
            format!("Final scores | Winner: {}", winners.join(", "))
        };
        let prompt = self.standings(session.status(), &title);
        session.render(&prompt).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lobby::{JOIN, START},
        seats::lock_seats,
        session::{SessionOutcome, Timing},
        testing::{button, identity, table, until_listening, until_rendered, RecordingSurface, CHAT},
    };

    struct Fixed(Vec<Question>);

    impl QuestionSource for Fixed {
        fn fetch(&mut self, amount: usize, _difficulty: Option<Difficulty>) -> GameResult<Vec<Question>> {
            Ok(self.0.iter().take(amount).cloned().collect())
        }
    }

    fn true_false() -> Question {
        question("Test", "Water is wet.", "True", &["False"], Difficulty::Hard)
    }

    #[test]
    fn points_by_kind_and_difficulty() {
        assert_eq!(true_false().points(), 1);
        let multiple = |d| question("Test", "?", "a", &["b", "c", "d"], d);
        assert_eq!(multiple(Difficulty::Easy).points(), 1);
        assert_eq!(multiple(Difficulty::Medium).points(), 2);
        assert_eq!(multiple(Difficulty::Hard).points(), 3);
    }

    #[test]
    fn asked_question_tracks_the_correct_letter() {
        let asked = Asked::new(question("Test", "?", "right", &["w1", "w2", "w3"], Difficulty::Easy));
        assert_eq!(asked.answers[asked.correct], "right");
        assert_eq!(asked.answers.len(), 4);

        let asked = Asked::new(true_false());
        assert_eq!(asked.answers, vec!["True", "False"]);
        assert_eq!(asked.correct, 0);
        assert_eq!(asked.answer_from("trivia:B"), Some(1));
        assert_eq!(asked.answer_from("trivia:C"), None);
    }

    #[test]
    fn builtin_bank_is_well_formed() {
        let bank = BuiltinQuestions::bank();
        assert!(bank.len() >= 10);
        for q in bank {
            assert!(q.incorrect.len() == 1 || q.incorrect.len() == 3, "{}", q.text);
            assert!(!q.incorrect.contains(&q.correct));
        }
        assert_eq!(BuiltinQuestions.fetch(3, None).unwrap().len(), 3);
        let hard = BuiltinQuestions.fetch(10, Some(Difficulty::Hard)).unwrap();
        assert!(!hard.is_empty());
        assert!(hard.iter().all(|q| q.difficulty == Difficulty::Hard));
    }

    #[test]
    fn options_clamp_and_keep_requested_bounds() {
        let options = TriviaOptions::new(Some(40), Some(5), Some(3), Some(1), Some(99));
        assert_eq!(options.rounds, 10);
        assert_eq!((options.bounds.min, options.bounds.max), (5, 3));
        assert!(!options.bounds.is_consistent());
        assert_eq!(options.round_time, Duration::from_secs(5));
        assert_eq!(options.pause, Duration::from_secs(15));

        let defaults = TriviaOptions::default();
        assert_eq!((defaults.bounds.min, defaults.bounds.max), (2, 4));
        assert_eq!(defaults.round_time, Duration::from_secs(20));
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("3"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn contradictory_bounds_end_before_any_lobby() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let mut game = Trivia::new(
            TriviaOptions::new(Some(1), Some(5), Some(3), None, None),
            Box::new(Fixed(vec![true_false()])),
        );

        let outcome = Session::run(table.clone(), identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game)
            .await
            .unwrap();

        assert_eq!(outcome, SessionOutcome::EndedEarly);
        assert!(surface.renders().is_empty());
        let notices = surface.notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("(5) cannot be more than the maximum (3)"));
        assert_eq!(lock_seats(&table.seats).seated(CHAT), 0);
    }

    async fn start_lobby(surface: &RecordingSurface, hub: &crate::events::EventHub) {
        until_listening(hub, CHAT).await;
        hub.publish(CHAT, button(identity(2, "bee"), 1, JOIN));
        hub.publish(CHAT, button(identity(1, "host"), 1, START));
        // Lobby, its join, its start, then the first question.
        until_rendered(surface, 4).await;
        until_listening(hub, CHAT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn scores_correct_answers() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move {
                let mut game = Trivia::new(TriviaOptions::new(Some(1), None, None, None, None), Box::new(Fixed(vec![true_false()])));
                Session::run(table, identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game).await
            }
        });
        start_lobby(&surface, &hub).await;

        let question = surface.renders()[3].message.0;
        hub.publish(CHAT, button(identity(3, "stranger"), question, "trivia:A"));
        hub.publish(CHAT, button(identity(1, "host"), question, "trivia:B"));
        hub.publish(CHAT, button(identity(1, "host"), question, "trivia:A"));
        hub.publish(CHAT, button(identity(2, "bee"), question, "trivia:B"));

        assert_eq!(task.await.unwrap().unwrap(), SessionOutcome::Finished);
        let last = surface.last_text();
        assert!(last.contains("Winner: host"));
        assert!(last.contains("host (A): 1"));
        assert!(last.contains("bee (B): 0"));
    }

    #[tokio::test(start_paused = true)]
    async fn silence_ends_the_game() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move {
                let mut game = Trivia::new(TriviaOptions::new(Some(2), None, None, None, None), Box::new(Fixed(vec![true_false(), true_false()])));
                Session::run(table, identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game).await
            }
        });
        start_lobby(&surface, &hub).await;

        assert_eq!(task.await.unwrap().unwrap(), SessionOutcome::Inactive);
        assert!(surface.last_text().contains("inactivity"));
    }

    #[tokio::test(start_paused = true)]
    async fn too_few_questions_end_before_play() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move {
                let mut game = Trivia::new(TriviaOptions::new(Some(3), None, None, None, None), Box::new(Fixed(vec![true_false()])));
                Session::run(table, identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game).await
            }
        });
        until_listening(&hub, CHAT).await;
        hub.publish(CHAT, button(identity(2, "bee"), 1, JOIN));
        hub.publish(CHAT, button(identity(1, "host"), 1, START));

        assert_eq!(task.await.unwrap().unwrap(), SessionOutcome::EndedEarly);
        assert_eq!(surface.notices().len(), 1);
    }
}
