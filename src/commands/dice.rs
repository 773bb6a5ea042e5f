//! Dice rolling commands.
//!
//! One roller behind three names: `r` prints the rolls, `rs` appends the
//! sum, `rnc` joins the digits with no separator (handy for lockout-style
//! number picks).

use async_trait::async_trait;
use rand::Rng;

use crate::commands::context::CommandContext;
use crate::commands::registry::Command;
use crate::errors::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollMode {
    Plain,
    Sum,
    Concat,
}

pub struct RollCommand {
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    mode: RollMode,
}

impl RollCommand {
    pub fn plain() -> Self {
        Self {
            name: "r",
            usage: "r [NdM]",
            description: "Rolls dice.",
            mode: RollMode::Plain,
        }
    }

    pub fn with_sum() -> Self {
        Self {
            name: "rs",
            usage: "rs [NdM]",
            description: "Rolls dice and shows the sum.",
            mode: RollMode::Sum,
        }
    }

    pub fn concatenated() -> Self {
        Self {
            name: "rnc",
            usage: "rnc [NdM]",
            description: "Rolls dice with no separator between results.",
            mode: RollMode::Concat,
        }
    }
}

#[async_trait]
impl Command for RollCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn usage(&self) -> &str {
        self.usage
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn run(&self, _ctx: &CommandContext, args: &str) -> Result<Option<String>, CommandError> {
        Ok(Some(execute(args, self.mode)))
    }
}

/// Parse a roll request: `NdM`, a bare face count `M` (one die), or empty
/// for a single d6. Anything else is a format error.
fn parse_dice(input: &str) -> Option<(i64, i64)> {
    if input.is_empty() {
        return Some((1, 6));
    }
    if let Some((count, faces)) = input.split_once('d') {
        if let (Ok(count), Ok(faces)) = (count.trim().parse(), faces.trim().parse()) {
            return Some((count, faces));
        }
    }
    input.trim().parse().ok().map(|faces| (1, faces))
}

fn roll(count: i64, faces: i64) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(1..=faces)).collect()
}

fn render(rolls: &[i64], mode: RollMode) -> String {
    let parts: Vec<String> = rolls.iter().map(i64::to_string).collect();
    match mode {
        RollMode::Plain => parts.join(","),
        RollMode::Sum => format!("{}|Σ={}", parts.join(","), rolls.iter().sum::<i64>()),
        RollMode::Concat => parts.concat(),
    }
}

fn execute(input: &str, mode: RollMode) -> String {
    let Some((count, faces)) = parse_dice(input) else {
        return "Invalid format!".to_string();
    };
    if faces < 1 {
        return "The dice must have at least one face!".to_string();
    }
    render(&roll(count, faces), mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dice_forms() {
        assert_eq!(parse_dice(""), Some((1, 6)));
        assert_eq!(parse_dice("3d6"), Some((3, 6)));
        assert_eq!(parse_dice("20"), Some((1, 20)));
        assert_eq!(parse_dice("2 d 6"), Some((2, 6)));
        assert_eq!(parse_dice("-2d6"), Some((-2, 6)));
    }

    #[test]
    fn test_parse_dice_rejects_garbage() {
        assert_eq!(parse_dice("d6"), None);
        assert_eq!(parse_dice("3d"), None);
        assert_eq!(parse_dice("3d4d5"), None);
        assert_eq!(parse_dice("abc"), None);
    }

    #[test]
    fn test_execute_invalid_format() {
        assert_eq!(execute("nope", RollMode::Plain), "Invalid format!");
    }

    #[test]
    fn test_execute_rejects_faceless_dice() {
        let msg = "The dice must have at least one face!";
        assert_eq!(execute("2d0", RollMode::Plain), msg);
        assert_eq!(execute("0", RollMode::Sum), msg);
        assert_eq!(execute("-5", RollMode::Concat), msg);
    }

    #[test]
    fn test_execute_one_faced_dice_are_deterministic() {
        assert_eq!(execute("3d1", RollMode::Plain), "1,1,1");
        assert_eq!(execute("3d1", RollMode::Sum), "1,1,1|Σ=3");
        assert_eq!(execute("5d1", RollMode::Concat), "11111");
    }

    #[test]
    fn test_execute_rolls_stay_in_range() {
        for _ in 0..50 {
            let out = execute("4d6", RollMode::Plain);
            let rolls: Vec<i64> = out.split(',').map(|r| r.parse().unwrap()).collect();
            assert_eq!(rolls.len(), 4);
            assert!(rolls.iter().all(|r| (1..=6).contains(r)));
        }
    }

    #[test]
    fn test_execute_default_is_one_d6() {
        let out = execute("", RollMode::Plain);
        let roll: i64 = out.parse().unwrap();
        assert!((1..=6).contains(&roll));
    }

    #[test]
    fn test_execute_negative_count_rolls_nothing() {
        assert_eq!(execute("-2d6", RollMode::Plain), "");
        assert_eq!(execute("-2d6", RollMode::Sum), "|Σ=0");
        assert_eq!(execute("-2d6", RollMode::Concat), "");
    }

    #[test]
    fn test_roll_command_names() {
        assert_eq!(RollCommand::plain().name(), "r");
        assert_eq!(RollCommand::with_sum().name(), "rs");
        assert_eq!(RollCommand::concatenated().name(), "rnc");
    }
}
