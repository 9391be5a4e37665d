use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::engine::agents::{Judge, ScriptWriter};
use crate::engine::engine::Engine;
use crate::engine::protocol::{EndReason, EngineCommand, EngineResponse};
use crate::model::turn::{Speaker, Turn};
use crate::ui::theme::Theme;

/// Line-oriented front end. The engine runs on its own thread and this side
/// blocks on its responses, so only one thing happens at a time.
pub struct TerminalApp<R, O> {
    input: R,
    out: O,
    theme: Theme,
    player: Option<String>,

    cmd_tx: Sender<EngineCommand>,
    resp_rx: Receiver<EngineResponse>,
    engine: JoinHandle<()>,
}

impl<R: BufRead, O: Write> TerminalApp<R, O> {
    pub fn new<W, J, F>(build_engine: F, input: R, out: O, theme: Theme) -> Self
    where
        W: ScriptWriter,
        J: Judge,
        F: FnOnce(Sender<EngineResponse>) -> Engine<W, J> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let engine = std::thread::spawn(move || {
            let mut engine = build_engine(resp_tx);
            engine.run(cmd_rx);
        });

        Self {
            input,
            out,
            theme,
            player: None,
            cmd_tx,
            resp_rx,
            engine,
        }
    }

    /// Plays the session to the end and hands back the output sink.
    pub fn run(mut self) -> Result<O> {
        while let Ok(resp) = self.resp_rx.recv() {
            match resp {
                EngineResponse::AwaitingInput {
                    round,
                    max_rounds,
                    player,
                } => {
                    let cmd = self.ask_player(round, max_rounds, &player)?;
                    if self.cmd_tx.send(cmd).is_err() {
                        debug!("engine stopped listening");
                        break;
                    }
                }
                EngineResponse::SessionEnded(reason) => {
                    self.draw_end(reason)?;
                    break;
                }
                other => self.draw(other)?,
            }
        }

        let Self {
            out,
            cmd_tx,
            engine,
            ..
        } = self;
        drop(cmd_tx);
        engine
            .join()
            .map_err(|_| anyhow!("engine thread panicked"))?;

        Ok(out)
    }

    fn ask_player(&mut self, round: u32, max_rounds: u32, player: &str) -> Result<EngineCommand> {
        writeln!(self.out)?;
        let header = format!("#### Round {round} of {max_rounds} ####");
        writeln!(self.out, "{}", self.theme.paint("system", &header))?;
        write!(self.out, "{}", self.theme.paint("player", &format!("{player}: ")))?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(EngineCommand::Disengage);
        }

        Ok(EngineCommand::PlayerInput(line))
    }

    fn draw(&mut self, resp: EngineResponse) -> Result<()> {
        match resp {
            EngineResponse::TranscriptLoaded { player, turns } => {
                self.player = Some(player);
                for turn in &turns {
                    self.draw_turn(turn)?;
                }
            }
            // already on screen as typed
            EngineResponse::PlayerTurnAccepted(_) => {}
            EngineResponse::TurnAppended(turn) => self.draw_turn(&turn)?,
            EngineResponse::GenerationAbandoned { reason, .. } => {
                let text = format!("(no reply this round: {reason})");
                writeln!(self.out, "{}", self.theme.paint("system", &text))?;
            }
            EngineResponse::Scored { score, .. } => {
                let text = format!("Judge: {score}");
                writeln!(self.out, "{}", self.theme.paint("judge", &text))?;
            }
            EngineResponse::ScoreUnavailable { .. } => {
                writeln!(self.out, "{}", self.theme.paint("system", "Judge: (no score)"))?;
            }
            EngineResponse::AwaitingInput { .. } | EngineResponse::SessionEnded(_) => {}
        }

        Ok(())
    }

    fn draw_turn(&mut self, turn: &Turn) -> Result<()> {
        let line = match turn.speaker() {
            Speaker::Narrator => self.theme.paint("narrator", turn.text()),
            Speaker::Character(id) => {
                let kind = if self.player.as_deref() == Some(id.as_str()) {
                    "player"
                } else {
                    "character"
                };
                self.theme.paint(kind, &format!("{id}: {}", turn.text()))
            }
        };

        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn draw_end(&mut self, reason: EndReason) -> Result<()> {
        let text = match reason {
            EndReason::Disengaged => "Session ended.",
            EndReason::RoundLimitReached => "Out of rounds. Session ended.",
        };
        writeln!(self.out)?;
        writeln!(self.out, "{}", self.theme.paint("system", text))?;
        Ok(())
    }
}
