use async_trait::async_trait;
use log::debug;
use rand::seq::SliceRandom;

use crate::{
    error::GameResult,
    events::Event,
    session::{Game, Negotiation, Round, Session},
    surface::{Control, Prompt, Status},
};

const WORDS: &str = include_str!("words.txt");

pub const GIVE_UP: &str = "mastermind:give_up";

pub fn builtin_words() -> Vec<String> {
    WORDS
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Default turn limit for a secret word of `length` letters.
pub fn max_turns_for(length: usize) -> u32 {
    match length {
        0..=3 => 8,
        4 => 11,
        5 => 15,
        _ => 20,
    }
}

/// Bulls are letters in the right place; cows are letters present in the
/// secret but somewhere else. Each secret letter counts at most once.
pub fn bulls_and_cows(guess: &str, secret: &str) -> (usize, usize) {
    let mut bulls = 0;
    let mut guess_left = Vec::new();
    let mut secret_left = Vec::new();
    for (g, s) in guess.chars().zip(secret.chars()) {
        if g == s {
            bulls += 1;
        } else {
            guess_left.push(g);
            secret_left.push(s);
        }
    }

    let mut cows = 0;
    for letter in secret_left {
        if let Some(pos) = guess_left.iter().position(|&c| c == letter) {
            guess_left.swap_remove(pos);
            cows += 1;
        }
    }
    (bulls, cows)
}

fn is_word(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic())
}

#[derive(Clone, Copy, Debug)]
pub struct MastermindOptions {
    pub length: usize,
    pub max_turns: u32,
}

impl MastermindOptions {
    pub fn new(length: Option<u64>, turns: Option<u64>) -> MastermindOptions {
        let length = length.map_or(5, |l| l.clamp(3, 8) as usize);
        MastermindOptions {
            length,
            max_turns: turns.map_or_else(|| max_turns_for(length), |t| t.clamp(1, 30) as u32),
        }
    }
}

impl Default for MastermindOptions {
    fn default() -> Self {
        MastermindOptions::new(None, None)
    }
}

#[derive(Debug)]
pub enum Move {
    Guess(String),
    GiveUp,
}

struct Guess {
    word: String,
    bulls: usize,
    cows: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ending {
    Solved,
    GaveUp,
    OutOfTurns,
}

pub struct Mastermind {
    options: MastermindOptions,
    words: Vec<String>,
    secret: String,
    guesses: Vec<Guess>,
    log: String,
    ending: Option<Ending>,
}

impl Mastermind {
    pub fn new(options: MastermindOptions) -> Mastermind {
        Mastermind::with_words(options, builtin_words())
    }

    pub fn with_words(options: MastermindOptions, words: Vec<String>) -> Mastermind {
        Mastermind {
            options,
            words,
            secret: String::new(),
            guesses: Vec::new(),
            log: String::new(),
            ending: None,
        }
    }

    fn warning(&self, word: &str) -> Option<String> {
        let length = word.chars().count();
        if length < self.options.length {
            Some(format!("{} is too short! The word has {} letters.", word, self.options.length))
        } else if length > self.options.length {
            Some(format!("{} is too long! The word has {} letters.", word, self.options.length))
        } else if !self.words.iter().any(|w| w == word) {
            Some(format!("{} is not in the word list.", word))
        } else {
            None
        }
    }

    fn prompt(&self, status: Status, open: bool) -> Prompt {
        let turn = (self.guesses.len() as u32 + u32::from(open)).min(self.options.max_turns);
        let mut lines = vec![format!("{status} Mastermind | Turn {}/{}", turn, self.options.max_turns)];

        if self.guesses.is_empty() {
            lines.push(format!(
                "Guess the {}-letter word by typing it in the chat. 🐂 are right letters in the right place, 🐄 are right letters in the wrong place.",
                self.options.length
            ));
        }
        for (i, guess) in self.guesses.iter().enumerate() {
            lines.push(format!(
                "{}. {} | 🐂 {} 🐄 {}",
                i + 1,
                guess.word.to_uppercase(),
                guess.bulls,
                guess.cows
            ));
        }

        lines.push(String::new());
        lines.push(String::from("Logs:"));
        lines.push(if self.log.is_empty() { String::from("-") } else { self.log.clone() });

        let prompt = Prompt::new(lines.join("\n"));
        if open {
            prompt.with_row(vec![Control::new("Give Up", GIVE_UP)])
        } else {
            prompt
        }
    }
}

#[async_trait]
impl Game for Mastermind {
    type Input = Move;

    fn name(&self) -> &'static str {
        "Mastermind"
    }

    fn negotiation(&self) -> Negotiation {
        Negotiation::Solo
    }

    async fn initialize(&mut self, session: &mut Session) -> GameResult<()> {
        let length = self.options.length;
        let secret = {
            let candidates: Vec<&String> = self.words.iter().filter(|w| w.chars().count() == length).collect();
            let mut rng = rand::thread_rng();
            candidates.choose(&mut rng).map(|w| w.to_string())
        };

        match secret {
            Some(secret) => {
                debug!("Mastermind secret in chat {}: {}", session.chat_id(), secret);
                self.secret = secret;
            }
            None => {
                session
                    .notify(&format!("There are no {length}-letter words to guess. Try another length."))
                    .await?;
                session.end();
            }
        }
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.ending.is_some()
    }

    async fn render(&mut self, session: &mut Session) -> GameResult<()> {
        let prompt = self.prompt(session.status(), true);
        session.render(&prompt).await?;
        Ok(())
    }

    async fn await_round(&mut self, session: &mut Session) -> GameResult<Round<Move>> {
        let message = session.message();
        let host = session.host().user_id;
        let mut collector = session.collector(
            move |event: &Event| match event {
                Event::Button { user, data, .. } => {
                    user.user_id == host && data == GIVE_UP && message.map_or(false, |m| event.is_on(m))
                }
                Event::Text { user, text, .. } => user.user_id == host && is_word(text),
            },
            session.collector_options().reset_on_collect(),
        );

        while let Some(event) = collector.next().await {
            let Some(text) = event.text() else {
                return Ok(Round::Input(Move::GiveUp));
            };
            let word = text.trim().to_lowercase();
            match self.warning(&word) {
                Some(warning) => {
                    self.log = warning;
                    let prompt = self.prompt(session.status(), true);
                    session.render(&prompt).await?;
                }
                None => return Ok(Round::Input(Move::Guess(word))),
            }
        }
        Ok(Round::Inactive)
    }

    async fn apply(&mut self, _session: &mut Session, input: Move) -> GameResult<()> {
        let word = match input {
            Move::GiveUp => {
                self.ending = Some(Ending::GaveUp);
                self.log = format!("You gave up! The word was {}.", self.secret.to_uppercase());
                return Ok(());
            }
            Move::Guess(word) => word,
        };

        let (bulls, cows) = bulls_and_cows(&word, &self.secret);
        let solved = word == self.secret;
        self.guesses.push(Guess { word, bulls, cows });

        if solved {
            self.ending = Some(Ending::Solved);
            self.log = format!(
                "You guessed the word {} in {} turn(s)!",
                self.secret.to_uppercase(),
                self.guesses.len()
            );
        } else if self.guesses.len() as u32 >= self.options.max_turns {
            self.ending = Some(Ending::OutOfTurns);
            self.log = format!("Game over! The word was {}.", self.secret.to_uppercase());
        } else {
            self.log.clear();
        }
        Ok(())
    }

    async fn finish(&mut self, session: &mut Session) -> GameResult<()> {
        if self.ending == Some(Ending::Solved) {
            session.set_status(Status::Success);
        } else {
            session.set_status(Status::Error);
        }
        let prompt = self.prompt(session.status(), false);
        session.render(&prompt).await?;
        Ok(())
    }
}
