use crate::model::grammar::ScriptGrammar;
use crate::model::score::Score;

/// A system/user message pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the instructions sent to the generation and judge services.
/// Formatting only: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn script(profile: &str, script: &str, speaker: &str) -> Prompt {
        let mut system = String::new();
        push_script_writer_role(&mut system);

        let mut user = String::new();
        push_profile_section(&mut user, profile);
        push_script_section(&mut user, script);
        push_script_reminder(&mut user, speaker);

        Prompt { system, user }
    }

    pub fn judge(script: &str, player: &str, ai: &str, goal: &str) -> Prompt {
        let mut system = String::new();
        push_judge_role(&mut system);

        let mut user = String::new();
        user.push_str(&format!(
            "Below is the transcript of a conversation between {ai} and {player}.\n\n"
        ));
        push_script_section(&mut user, script);
        push_goal_question(&mut user, goal);

        Prompt { system, user }
    }
}

fn push_script_writer_role(prompt: &mut String) {
    prompt.push_str(
        "You're a professional script writer. \
         You're given a description of a character and the script so far. \
         Complete the next line of the script in the most realistic way possible. \
         Include no explanation of your reasoning.\n",
    );
}

fn push_judge_role(prompt: &mut String) {
    prompt.push_str(&format!(
        "You're a couples therapist listening in on the conversation outlined in this script. \
         You rate interactions on a scale of {min}-{max}. \
         You must respond in exactly this format with no exceptions:\n\
         {{\"score\": <integer {min}-{max}>}}\n",
        min = Score::MIN,
        max = Score::MAX,
    ));
}

fn push_profile_section(prompt: &mut String, profile: &str) {
    prompt.push_str("Here's a description of our character's psyche and personality traits:\n");
    prompt.push_str(profile.trim());
    prompt.push_str("\n\n");
}

fn push_script_section(prompt: &mut String, script: &str) {
    prompt.push_str("SCRIPT:\n");
    prompt.push_str(script);
    if !script.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push('\n');
}

fn push_script_reminder(prompt: &mut String, speaker: &str) {
    prompt.push_str("Predict the next line of the script. ");
    prompt.push_str(&ScriptGrammar::reply_format(speaker));
    prompt.push_str(" Ensure that the script captures their psyche.\n");
}

fn push_goal_question(prompt: &mut String, goal: &str) {
    prompt.push_str(&format!(
        "On a scale of {min}-{max} ({min}=strongly disagree, {max}=strongly agree), \
         how much would you agree with the following statement: {goal}\n",
        min = Score::MIN,
        max = Score::MAX,
    ));
}
