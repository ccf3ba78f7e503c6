//! Facility-management instructions.
//!
//! None of these can fail: table indices are clamped and register arithmetic
//! wraps. The only fallible step, meltdown's risk counter update, swallows
//! its own error.

use std::ops::RangeInclusive;

use lcasm_core::Register;

use crate::error::Result;
use crate::format::IFields;
use crate::risk::{ego_bonus, OrdealLevel, RiskTier};
use crate::semantics::Context;

/// `$t0` through `$t7`.
pub const AGENT_BAND: RangeInclusive<u8> = 8..=15;
/// Where suppress reports success.
pub const SUPPRESS_RESULT: Register = Register::V0;
/// Byte offset of the global risk counter from `$gp`.
pub const RISK_COUNTER_OFFSET: i32 = 8;
pub const RISK_CEILING: i32 = 4;
pub const MELTDOWN_PENALTY: i32 = 10;

const EXTRACTION_DRAWS: u32 = 10;

fn agent_band() -> impl Iterator<Item = Register> {
    AGENT_BAND.map(Register::new)
}

pub fn extract(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let tier = RiskTier::clamped(fields.simm());
    let draw = ctx.random.below(EXTRACTION_DRAWS);
    let scaled = tier.extraction_multiplier() * (1 + draw) as f32;
    let delta = 1 + scaled as i32;
    let base = ctx.state.register(fields.rs);
    tracing::trace!("extract: {} draw {} yields {}", tier, draw, delta);
    ctx.state.set_register(fields.rt, base.wrapping_add(delta));
    Ok(())
}

/// Shared body of the four work instructions.
fn work(ctx: &mut Context<'_>, fields: IFields, name: &str, attribute: &str) -> Result<()> {
    let increase = fields.simm();
    let current = ctx.state.register(fields.rs);
    ctx.state
        .set_register(fields.rt, current.wrapping_add(increase));
    ctx.emit(&format!("{}: {} increased by {}", name, attribute, increase));
    Ok(())
}

pub fn winst(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    work(ctx, fields, "WINST", "Fortitude")
}

pub fn winsight(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    work(ctx, fields, "WINSIGHT", "Prudence")
}

pub fn wattach(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    work(ctx, fields, "WATTACH", "Temperance")
}

pub fn wrepress(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    work(ctx, fields, "WREPRESS", "Justice")
}

pub fn suppress(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let tier = RiskTier::clamped(fields.simm());
    let agent_power = ctx.state.register(fields.rs);
    let abno_power = ctx.state.register(fields.rt);
    let effective = tier.suppression_threshold(abno_power);
    let success = i64::from(agent_power) > effective;
    tracing::trace!(
        "suppress: agent {} vs {} abnormality {} (effective {}): {}",
        agent_power,
        tier,
        abno_power,
        effective,
        success
    );
    ctx.state.set_register(SUPPRESS_RESULT, i32::from(success));
    Ok(())
}

pub fn ordeal(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let level = fields.simm();
    let severity = OrdealLevel::clamped(level).severity();
    let band_width = (AGENT_BAND.end() - AGENT_BAND.start() + 1) as u32;
    let offset = ctx.random.below(band_width) % band_width;
    let struck = Register::new(AGENT_BAND.start() + offset as u8);
    let current = ctx.state.register(struck);
    ctx.state
        .set_register(struck, current.wrapping_sub(severity));
    ctx.emit(&format!("Ordeal level {} struck ${}!", level, struck.index()));
    Ok(())
}

pub fn ego(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let id = fields.simm();
    let bonus = ego_bonus(id);
    let agent = fields.rt;
    let current = ctx.state.register(agent);
    ctx.state.set_register(agent, current.wrapping_add(bonus));
    ctx.emit(&format!(
        "Equipped E.G.O id {} on agent ${} (+{}).",
        id,
        agent.index(),
        bonus
    ));
    Ok(())
}

pub fn panic(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let clerk = fields.rs;
    ctx.state.set_register(clerk, 0);
    ctx.emit(&format!(
        "PANIC: Clerk in register ${} has panicked! Register cleared to 0.",
        clerk.index()
    ));
    Ok(())
}

pub fn meltdown(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    ctx.emit(&format!(
        "MELTDOWN: Department {} in full meltdown!",
        fields.rs.index()
    ));

    for agent in agent_band() {
        let current = ctx.state.register(agent);
        ctx.state
            .set_register(agent, current.saturating_sub(MELTDOWN_PENALTY).max(0));
    }
    ctx.emit(&format!("All agents penalized by {} points", MELTDOWN_PENALTY));

    let address = ctx
        .state
        .register(Register::GP)
        .wrapping_add(RISK_COUNTER_OFFSET) as u32;
    let raised = ctx
        .state
        .read_word(address)
        .and_then(|risk| {
            ctx.state
                .write_word(address, risk.saturating_add(1).min(RISK_CEILING))
        });
    match raised {
        Ok(()) => ctx.emit("Global risk level increased"),
        Err(err) => tracing::debug!("meltdown left the risk counter alone: {}", err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lcasm_core::{MachineState, RandomSource, Register};

    use super::*;
    use crate::semantics::testing::Harness;

    const T1: Register = Register::new(9);
    const T2: Register = Register::new(10);
    const S1: Register = Register::new(17);

    #[test]
    fn extract_uses_favorable_multiplier() {
        // draw 9 -> factor 10
        let mut h = Harness::with_draws(&[9]);
        h.machine.set_register(T2, 100);
        extract(&mut h.context(), IFields::new(T2, T1, 0)).unwrap();
        assert_eq!(h.machine.register(T1), 100 + 1 + 10);

        extract(&mut h.context(), IFields::new(T2, T1, 4)).unwrap();
        assert_eq!(h.machine.register(T1), 100 + 1 + 5);
        assert!(h.output.is_empty());
    }

    #[test]
    fn extract_clamps_risk() {
        for draw in 0..10 {
            let mut a = Harness::with_draws(&[draw]);
            let mut b = Harness::with_draws(&[draw]);
            extract(&mut a.context(), IFields::new(T2, T1, 99)).unwrap();
            extract(&mut b.context(), IFields::new(T2, T1, 4)).unwrap();
            assert_eq!(a.machine.register(T1), b.machine.register(T1));

            extract(&mut a.context(), IFields::new(T2, T1, -5)).unwrap();
            extract(&mut b.context(), IFields::new(T2, T1, 0)).unwrap();
            assert_eq!(a.machine.register(T1), b.machine.register(T1));
        }
    }

    #[test]
    fn extract_delta_stays_in_range() {
        let mut h = Harness::with_draws(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for risk in 0..5 {
            for _ in 0..10 {
                extract(&mut h.context(), IFields::new(Register::ZERO, T1, risk)).unwrap();
                let delta = h.machine.register(T1);
                assert!((1..=11).contains(&delta), "risk {} delta {}", risk, delta);
            }
        }
    }

    #[test]
    fn work_instructions_add_and_report() {
        let mut h = Harness::new();
        h.machine.set_register(T2, 20);
        winst(&mut h.context(), IFields::new(T2, T1, 15)).unwrap();
        assert_eq!(h.machine.register(T1), 35);
        winsight(&mut h.context(), IFields::new(T2, T1, -30)).unwrap();
        assert_eq!(h.machine.register(T1), -10);
        wattach(&mut h.context(), IFields::new(T1, T1, 8)).unwrap();
        assert_eq!(h.machine.register(T1), -2);
        wrepress(&mut h.context(), IFields::new(T2, T2, 12)).unwrap();
        assert_eq!(h.machine.register(T2), 32);
        assert_eq!(
            h.output,
            vec![
                "WINST: Fortitude increased by 15",
                "WINSIGHT: Prudence increased by -30",
                "WATTACH: Temperance increased by 8",
                "WREPRESS: Justice increased by 12",
            ]
        );
    }

    #[test]
    fn suppress_is_strictly_greater() {
        let mut h = Harness::new();
        h.machine.set_register(T1, 30);
        h.machine.set_register(T2, 10);
        // 10 * 3.0 == 30, not strictly greater
        suppress(&mut h.context(), IFields::new(T1, T2, 4)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 0);

        h.machine.set_register(T1, 31);
        suppress(&mut h.context(), IFields::new(T1, T2, 4)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 1);

        // 10 * 2.0 == 20
        h.machine.set_register(T1, 20);
        suppress(&mut h.context(), IFields::new(T1, T2, 3)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 0);
    }

    #[test]
    fn suppress_compares_large_powers_exactly() {
        // 2^24 + 1 has no exact f32 representation
        let power = (1 << 24) + 1;
        let mut h = Harness::new();
        h.machine.set_register(T1, power);
        h.machine.set_register(T2, power);
        suppress(&mut h.context(), IFields::new(T1, T2, 0)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 0);

        h.machine.set_register(T1, power + 1);
        suppress(&mut h.context(), IFields::new(T1, T2, 0)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 1);

        // threshold beyond i32 range can never be beaten
        h.machine.set_register(T1, i32::MAX);
        h.machine.set_register(T2, i32::MAX / 2);
        suppress(&mut h.context(), IFields::new(T1, T2, 4)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 0);
    }

    #[test]
    fn suppress_clamps_risk_and_always_writes_v0() {
        let mut h = Harness::new();
        h.machine.set_register(T1, 25);
        h.machine.set_register(T2, 10);
        h.machine.set_register(SUPPRESS_RESULT, 77);
        suppress(&mut h.context(), IFields::new(T1, T2, 99)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 0);
        suppress(&mut h.context(), IFields::new(T1, T2, -3)).unwrap();
        assert_eq!(h.machine.register(SUPPRESS_RESULT), 1);
        assert_eq!(h.machine.register(T1), 25);
        assert_eq!(h.machine.register(T2), 10);
    }

    #[test]
    fn ordeal_strikes_agent_band_without_floor() {
        let mut h = Harness::with_draws(&[3]);
        h.machine.set_register(Register::new(11), 7);
        ordeal(&mut h.context(), IFields::new(Register::ZERO, Register::ZERO, 2)).unwrap();
        assert_eq!(h.machine.register(Register::new(11)), 7 - 20);
        assert_eq!(h.output, vec!["Ordeal level 2 struck $11!"]);
    }

    #[test]
    fn ordeal_clamps_level() {
        let mut h = Harness::with_draws(&[0]);
        ordeal(&mut h.context(), IFields::new(Register::ZERO, Register::ZERO, 9)).unwrap();
        assert_eq!(h.machine.register(Register::T0), -40);
        ordeal(&mut h.context(), IFields::new(Register::ZERO, Register::ZERO, -1)).unwrap();
        assert_eq!(h.machine.register(Register::T0), -45);
    }

    #[test]
    fn ordeal_only_touches_agent_band() {
        let draws: Vec<u32> = (0..64).collect();
        let mut h = Harness::with_draws(&draws);
        for _ in 0..64 {
            ordeal(&mut h.context(), IFields::new(Register::ZERO, Register::ZERO, 0)).unwrap();
        }
        for (register, value) in h.machine.registers().iter() {
            if AGENT_BAND.contains(&register.index()) {
                assert_eq!(value, -40, "{:?}", register);
            } else if register != Register::GP && register != Register::SP {
                assert_eq!(value, 0, "{:?}", register);
            }
        }
    }

    struct Saturated;

    impl RandomSource for Saturated {
        fn below(&mut self, _bound: u32) -> u32 {
            u32::MAX
        }
    }

    #[test]
    fn ordeal_keeps_out_of_range_draws_in_band() {
        let mut h = Harness::new();
        let mut random = Saturated;
        let mut ctx = Context {
            state: &mut h.machine,
            random: &mut random,
            output: &mut h.output,
        };
        ordeal(&mut ctx, IFields::new(Register::ZERO, Register::ZERO, 0)).unwrap();
        // u32::MAX % 8 == 7
        assert_eq!(h.machine.register(Register::T7), -5);
        assert_eq!(h.output, vec!["Ordeal level 0 struck $15!"]);
    }

    #[test]
    fn ego_adds_clamped_bonus() {
        let mut h = Harness::new();
        h.machine.set_register(Register::T0, 10);
        ego(&mut h.context(), IFields::new(Register::ZERO, Register::T0, 3)).unwrap();
        assert_eq!(h.machine.register(Register::T0), 15);
        ego(&mut h.context(), IFields::new(Register::ZERO, Register::T0, 99)).unwrap();
        assert_eq!(h.machine.register(Register::T0), 23);
        assert_eq!(
            h.output,
            vec![
                "Equipped E.G.O id 3 on agent $8 (+5).",
                "Equipped E.G.O id 99 on agent $8 (+8).",
            ]
        );
    }

    #[test]
    fn panic_zeroes_register() {
        let mut h = Harness::new();
        h.machine.set_register(T1, -1234);
        panic(&mut h.context(), IFields::new(T1, Register::ZERO, 0)).unwrap();
        assert_eq!(h.machine.register(T1), 0);
        assert_eq!(
            h.output,
            vec!["PANIC: Clerk in register $9 has panicked! Register cleared to 0."]
        );
    }

    #[test]
    fn meltdown_penalizes_band_and_raises_risk() {
        let mut h = Harness::new();
        let values = [0, 5, 10, 11, 100, -3, i32::MIN, i32::MAX];
        for (register, value) in agent_band().zip(values) {
            h.machine.set_register(register, value);
        }
        h.machine.set_register(S1, 50);
        let counter = 0x1000_8000 + 8;
        h.machine.write_word(counter, 2).unwrap();

        meltdown(&mut h.context(), IFields::new(S1, Register::ZERO, 0)).unwrap();

        for (register, value) in agent_band().zip(values) {
            assert_eq!(
                h.machine.register(register),
                value.saturating_sub(10).max(0)
            );
        }
        assert_eq!(h.machine.register(Register::new(11)), 1);
        assert_eq!(h.machine.register(S1), 50);
        assert_eq!(h.machine.read_word(counter), Ok(3));
        // the word right above $gp is not the counter
        assert_eq!(h.machine.read_word(0x1000_8004), Ok(0));
        assert_eq!(
            h.output,
            vec![
                "MELTDOWN: Department 17 in full meltdown!",
                "All agents penalized by 10 points",
                "Global risk level increased",
            ]
        );
    }

    #[test]
    fn meltdown_risk_counter_is_capped() {
        let mut h = Harness::new();
        let counter = 0x1000_8008;
        h.machine.write_word(counter, 4).unwrap();
        meltdown(&mut h.context(), IFields::new(S1, Register::ZERO, 0)).unwrap();
        assert_eq!(h.machine.read_word(counter), Ok(4));
        h.machine.write_word(counter, i32::MAX).unwrap();
        meltdown(&mut h.context(), IFields::new(S1, Register::ZERO, 0)).unwrap();
        assert_eq!(h.machine.read_word(counter), Ok(4));
    }

    #[test]
    fn meltdown_survives_bad_global_pointer() {
        let mut h = Harness::new();
        h.machine.set_register(Register::T0, 25);
        for gp in [0x1000_8001, 0] {
            h.machine.set_register(Register::GP, gp);
            meltdown(&mut h.context(), IFields::new(S1, Register::ZERO, 0)).unwrap();
        }
        assert_eq!(h.machine.register(Register::T0), 5);
        assert!(!h.output.iter().any(|line| line == "Global risk level increased"));
    }
}
