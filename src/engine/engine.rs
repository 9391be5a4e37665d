use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, info, warn};

use crate::engine::agents::{Judge, ScriptWriter};
use crate::engine::llm_decode::{decode_score, decode_script};
use crate::engine::protocol::{EndReason, EngineCommand, EngineResponse};
use crate::engine::script_parser::parse_script;
use crate::engine::validated::invoke;
use crate::model::grammar::ScriptGrammar;
use crate::model::session_config::SessionConfig;
use crate::model::transcript::Transcript;
use crate::model::turn::{Speaker, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUserInput,
    GeneratingResponse,
    Scoring,
    Terminal,
}

/// Runs one role-play session: player line in, AI line(s) out, judge score.
///
/// The engine owns the transcript and is the only thing that appends to it.
/// Everything the player should see goes out through `tx` in the order it
/// happens.
pub struct Engine<W, J> {
    tx: Sender<EngineResponse>,
    config: SessionConfig,
    grammar: ScriptGrammar,
    profile: String,
    transcript: Transcript,
    writer: W,
    judge: J,
    state: SessionState,
    rounds_completed: u32,
}

impl<W: ScriptWriter, J: Judge> Engine<W, J> {
    pub fn new(
        config: SessionConfig,
        profile: impl Into<String>,
        prescript: &str,
        writer: W,
        judge: J,
        tx: Sender<EngineResponse>,
    ) -> Self {
        let grammar = config.grammar();
        let transcript = Transcript::from_turns(parse_script(prescript, &grammar));

        Self {
            tx,
            config,
            grammar,
            profile: profile.into(),
            transcript,
            writer,
            judge,
            state: SessionState::AwaitingUserInput,
            rounds_completed: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Announce the pre-script and ask for the first line.
    pub fn start(&self) {
        self.send(EngineResponse::TranscriptLoaded {
            player: self.config.player().to_string(),
            turns: self.transcript.turns().to_vec(),
        });
        self.prompt_player();
    }

    pub fn run(&mut self, rx: Receiver<EngineCommand>) {
        self.start();

        while self.state != SessionState::Terminal {
            match rx.recv() {
                Ok(cmd) => {
                    self.handle(cmd);
                }
                Err(_) => {
                    debug!("command channel closed");
                    self.end(EndReason::Disengaged);
                }
            }
        }
    }

    pub fn handle(&mut self, cmd: EngineCommand) -> SessionState {
        match cmd {
            EngineCommand::PlayerInput(text) => self.submit(&text),
            EngineCommand::Disengage => {
                self.end(EndReason::Disengaged);
                self.state
            }
        }
    }

    /// Play one full round with `input` as the player's line.
    ///
    /// Blank input ends the session without touching the transcript.
    pub fn submit(&mut self, input: &str) -> SessionState {
        if self.state != SessionState::AwaitingUserInput {
            warn!(state = ?self.state, "player input ignored");
            return self.state;
        }

        let line = input
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let Some(turn) = Turn::new(Speaker::character(self.config.player()), &line) else {
            info!("empty input, player disengaged");
            self.end(EndReason::Disengaged);
            return self.state;
        };

        self.transcript.append(turn.clone());
        self.send(EngineResponse::PlayerTurnAccepted(turn));

        self.state = SessionState::GeneratingResponse;
        if !self.generate_response() {
            self.state = SessionState::AwaitingUserInput;
            self.prompt_player();
            return self.state;
        }

        self.state = SessionState::Scoring;
        self.score_round();
        self.finish_round();

        self.state
    }

    fn generate_response(&mut self) -> bool {
        let script = self.transcript.render();
        let ai = self.config.ai();

        let result = invoke(
            "generation",
            || self.writer.generate(&self.profile, &script, ai),
            |raw| decode_script(raw, &self.grammar, ai),
            self.config.max_attempts(),
        );

        match result {
            Ok(validated) => {
                debug!(attempts = validated.attempts, turns = validated.value.len(), "generated");
                for turn in validated.value {
                    self.append(turn);
                }
                true
            }
            Err(err) => {
                warn!(round = self.current_round(), error = %err, "abandoning generation");
                self.send(EngineResponse::GenerationAbandoned {
                    round: self.current_round(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    fn score_round(&mut self) {
        let script = self.transcript.render();
        let round = self.current_round();

        let result = invoke(
            "judge",
            || {
                self.judge.score(
                    &script,
                    self.config.player(),
                    self.config.ai(),
                    self.config.goal(),
                )
            },
            decode_score,
            self.config.max_attempts(),
        );

        match result {
            Ok(validated) => {
                info!(round, score = validated.value.value(), "round scored");
                self.send(EngineResponse::Scored {
                    round,
                    score: validated.value,
                });
            }
            Err(err) => {
                warn!(round, error = %err, "score unavailable");
                self.send(EngineResponse::ScoreUnavailable {
                    round,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn finish_round(&mut self) {
        self.rounds_completed += 1;

        if self.rounds_completed >= self.config.max_rounds() {
            self.end(EndReason::RoundLimitReached);
        } else {
            self.state = SessionState::AwaitingUserInput;
            self.prompt_player();
        }
    }

    fn append(&mut self, turn: Turn) {
        self.transcript.append(turn.clone());
        self.send(EngineResponse::TurnAppended(turn));
    }

    fn end(&mut self, reason: EndReason) {
        if self.state == SessionState::Terminal {
            return;
        }

        info!(?reason, rounds = self.rounds_completed, "session ended");
        self.state = SessionState::Terminal;
        self.send(EngineResponse::SessionEnded(reason));
    }

    fn prompt_player(&self) {
        self.send(EngineResponse::AwaitingInput {
            round: self.current_round(),
            max_rounds: self.config.max_rounds(),
            player: self.config.player().to_string(),
        });
    }

    fn current_round(&self) -> u32 {
        self.rounds_completed + 1
    }

    fn send(&self, resp: EngineResponse) {
        // The UI may already be gone; nothing useful to do then.
        let _ = self.tx.send(resp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::AgentError;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::sync::mpsc;

    /// Replays queued replies, then repeats `fallback`.
    struct Scripted {
        replies: RefCell<VecDeque<&'static str>>,
        fallback: &'static str,
        calls: Cell<u32>,
        last_script: RefCell<String>,
    }

    impl Scripted {
        fn new(replies: &[&'static str], fallback: &'static str) -> Self {
            Self {
                replies: RefCell::new(replies.iter().copied().collect()),
                fallback,
                calls: Cell::new(0),
                last_script: RefCell::new(String::new()),
            }
        }

        fn next(&self, script: &str) -> Result<String, AgentError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_script.borrow_mut() = script.to_string();
            let reply = self.replies.borrow_mut().pop_front().unwrap_or(self.fallback);
            Ok(reply.to_string())
        }
    }

    impl ScriptWriter for &Scripted {
        fn generate(&self, _: &str, script: &str, _: &str) -> Result<String, AgentError> {
            self.next(script)
        }
    }

    impl Judge for &Scripted {
        fn score(&self, script: &str, _: &str, _: &str, _: &str) -> Result<String, AgentError> {
            self.next(script)
        }
    }

    fn config(max_rounds: u32) -> SessionConfig {
        SessionConfig::new(
            "ALEX",
            "JILL",
            "ALEX successfully solicited affection from JILL",
            max_rounds,
            10,
        )
        .unwrap()
    }

    fn engine<'a>(
        max_rounds: u32,
        writer: &'a Scripted,
        judge: &'a Scripted,
    ) -> (Engine<&'a Scripted, &'a Scripted>, mpsc::Receiver<EngineResponse>) {
        let (tx, rx) = mpsc::channel();
        let engine = Engine::new(
            config(max_rounds),
            "Jill is guarded.",
            "JILL: Hello.\n",
            writer,
            judge,
            tx,
        );
        (engine, rx)
    }

    fn pairs(transcript: &Transcript) -> Vec<(&str, &str)> {
        transcript
            .turns()
            .iter()
            .map(|t| (t.speaker().id(), t.text()))
            .collect()
    }

    fn scores(events: &[EngineResponse]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineResponse::Scored { score, .. } => Some(score.value()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_round_appends_player_and_generated_turns() {
        // Arrange
        let writer = Scripted::new(&[], "JILL: Hey yourself.");
        let judge = Scripted::new(&[], "{\"score\": 35}");
        let (mut engine, rx) = engine(10, &writer, &judge);

        // Act
        let state = engine.submit("Hi Jill");

        // Assert
        assert_eq!(state, SessionState::AwaitingUserInput);
        assert_eq!(
            pairs(engine.transcript()),
            [("JILL", "Hello."), ("ALEX", "Hi Jill"), ("JILL", "Hey yourself.")]
        );
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(scores(&events), [35]);
        assert_eq!(engine.rounds_completed(), 1);
    }

    #[test]
    fn test_generated_player_lines_are_reported_as_appended() {
        let writer = Scripted::new(&[], "ALEX: (takes her hand)\nJILL: Oh.");
        let judge = Scripted::new(&[], "50");
        let (mut engine, rx) = engine(10, &writer, &judge);

        engine.submit("Hi Jill");

        let player = Turn::new(Speaker::character("ALEX"), "Hi Jill").unwrap();
        let generated = Turn::new(Speaker::character("ALEX"), "(takes her hand)").unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0], EngineResponse::PlayerTurnAccepted(player));
        assert_eq!(events[1], EngineResponse::TurnAppended(generated));
        assert_eq!(engine.transcript().len(), 4);
    }

    #[test]
    fn test_agents_see_rendered_transcript() {
        let writer = Scripted::new(&[], "JILL: Hey yourself.");
        let judge = Scripted::new(&[], "50");
        let (mut engine, _rx) = engine(10, &writer, &judge);

        engine.submit("Hi Jill");

        assert_eq!(*writer.last_script.borrow(), "JILL: Hello.\n\nALEX: Hi Jill\n\n");
        assert_eq!(
            *judge.last_script.borrow(),
            "JILL: Hello.\n\nALEX: Hi Jill\n\nJILL: Hey yourself.\n\n"
        );
    }

    #[test]
    fn test_generation_recovers_after_malformed_replies() {
        let writer = Scripted::new(&["", "  \n", "{\"oops\": 1}"], "She smiles.\nJILL: Fine.");
        let judge = Scripted::new(&[], "61");
        let (mut engine, rx) = engine(10, &writer, &judge);

        engine.submit("Hi Jill");

        assert_eq!(writer.calls.get(), 4);
        assert_eq!(
            pairs(engine.transcript()),
            [
                ("JILL", "Hello."),
                ("ALEX", "Hi Jill"),
                ("narrator", "She smiles."),
                ("JILL", "Fine."),
            ]
        );
        let events: Vec<_> = rx.try_iter().collect();
        assert!(!events
            .iter()
            .any(|e| matches!(e, EngineResponse::GenerationAbandoned { .. })));
        assert_eq!(scores(&events), [61]);
    }

    #[test]
    fn test_judge_exhaustion_skips_score_but_keeps_turns() {
        let writer = Scripted::new(&[], "JILL: Whatever.");
        let judge = Scripted::new(&[], "I would say about half.");
        let (mut engine, rx) = engine(10, &writer, &judge);

        let state = engine.submit("Hi Jill");

        assert_eq!(judge.calls.get(), 10);
        assert_eq!(state, SessionState::AwaitingUserInput);
        assert_eq!(engine.transcript().len(), 3);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(scores(&events).is_empty());
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineResponse::ScoreUnavailable { round: 1, .. })));
        assert_eq!(
            events.last(),
            Some(&EngineResponse::AwaitingInput {
                round: 2,
                max_rounds: 10,
                player: "ALEX".into(),
            })
        );
    }

    #[test]
    fn test_generation_exhaustion_abandons_round() {
        let writer = Scripted::new(&[], "   ");
        let judge = Scripted::new(&[], "50");
        let (mut engine, rx) = engine(10, &writer, &judge);

        let state = engine.submit("Hi Jill");

        assert_eq!(state, SessionState::AwaitingUserInput);
        assert_eq!(writer.calls.get(), 10);
        assert_eq!(judge.calls.get(), 0);
        assert_eq!(pairs(engine.transcript()), [("JILL", "Hello."), ("ALEX", "Hi Jill")]);
        assert_eq!(engine.rounds_completed(), 0);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineResponse::GenerationAbandoned { round: 1, .. })));
    }

    #[test]
    fn test_empty_input_disengages_without_new_turns() {
        let writer = Scripted::new(&[], "JILL: ...");
        let judge = Scripted::new(&[], "50");
        let (mut engine, rx) = engine(10, &writer, &judge);

        let state = engine.submit("   ");

        assert_eq!(state, SessionState::Terminal);
        assert_eq!(engine.transcript().len(), 1);
        assert_eq!(writer.calls.get(), 0);
        assert_eq!(
            rx.try_iter().last(),
            Some(EngineResponse::SessionEnded(EndReason::Disengaged))
        );
    }

    #[test]
    fn test_round_limit_reaches_terminal() {
        let writer = Scripted::new(&[], "JILL: Mm.");
        let judge = Scripted::new(&[], "10");
        let (mut engine, rx) = engine(2, &writer, &judge);

        assert_eq!(engine.submit("one"), SessionState::AwaitingUserInput);
        assert_eq!(engine.submit("two"), SessionState::Terminal);
        assert_eq!(engine.submit("three"), SessionState::Terminal);

        assert_eq!(engine.rounds_completed(), 2);
        assert_eq!(engine.transcript().len(), 5);
        assert_eq!(
            rx.try_iter().last(),
            Some(EngineResponse::SessionEnded(EndReason::RoundLimitReached))
        );
    }

    #[test]
    fn test_multiline_player_input_becomes_one_turn() {
        let writer = Scripted::new(&[], "JILL: Ok.");
        let judge = Scripted::new(&[], "10");
        let (mut engine, _rx) = engine(10, &writer, &judge);

        engine.submit("  Hi.\n\nHow are you?  ");

        assert_eq!(engine.transcript().turns()[1].text(), "Hi. How are you?");
    }

    #[test]
    fn test_run_drives_engine_from_channel() {
        let writer = Scripted::new(&[], "JILL: Sure.");
        let judge = Scripted::new(&[], "77");
        let (mut engine, rx) = engine(10, &writer, &judge);
        let (cmd_tx, cmd_rx) = mpsc::channel();

        cmd_tx.send(EngineCommand::PlayerInput("Hi Jill".into())).unwrap();
        cmd_tx.send(EngineCommand::Disengage).unwrap();
        engine.run(cmd_rx);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events.first(),
            Some(&EngineResponse::TranscriptLoaded {
                player: "ALEX".into(),
                turns: engine.transcript().turns()[..1].to_vec(),
            })
        );
        assert_eq!(scores(&events), [77]);
        assert_eq!(
            events.last(),
            Some(&EngineResponse::SessionEnded(EndReason::Disengaged))
        );
        assert_eq!(engine.state(), SessionState::Terminal);
    }

    #[test]
    fn test_run_ends_when_channel_closes() {
        let writer = Scripted::new(&[], "JILL: Sure.");
        let judge = Scripted::new(&[], "77");
        let (mut engine, rx) = engine(10, &writer, &judge);
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        drop(cmd_tx);

        engine.run(cmd_rx);

        assert_eq!(engine.state(), SessionState::Terminal);
        assert_eq!(
            rx.try_iter().last(),
            Some(EngineResponse::SessionEnded(EndReason::Disengaged))
        );
    }
}
