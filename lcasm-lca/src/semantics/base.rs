use lcasm_core::Register;

use crate::error::{ExecutionError, Result};
use crate::format::{IFields, JFields, RFields};
use crate::semantics::Context;

fn overflow(mnemonic: &'static str) -> ExecutionError {
    ExecutionError::ArithmeticOverflow { mnemonic }
}

/// Signed add that fails when both operands share a sign the sum does not.
fn add_checked(mnemonic: &'static str, lhs: i32, rhs: i32) -> Result<i32> {
    let sum = lhs.wrapping_add(rhs);
    if (lhs >= 0) == (rhs >= 0) && (sum >= 0) != (lhs >= 0) {
        return Err(overflow(mnemonic));
    }
    Ok(sum)
}

/// Signed subtract that fails when the operands differ in sign and the result
/// takes the subtrahend's sign.
fn sub_checked(mnemonic: &'static str, lhs: i32, rhs: i32) -> Result<i32> {
    let difference = lhs.wrapping_sub(rhs);
    if (lhs >= 0) != (rhs >= 0) && (difference >= 0) != (lhs >= 0) {
        return Err(overflow(mnemonic));
    }
    Ok(difference)
}

fn effective_address(ctx: &Context<'_>, fields: IFields) -> u32 {
    ctx.state.register(fields.rs).wrapping_add(fields.simm()) as u32
}

pub fn add(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let sum = add_checked(
        "add",
        ctx.state.register(fields.rs),
        ctx.state.register(fields.rt),
    )?;
    ctx.state.set_register(fields.rd, sum);
    Ok(())
}

pub fn sub(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let difference = sub_checked(
        "sub",
        ctx.state.register(fields.rs),
        ctx.state.register(fields.rt),
    )?;
    ctx.state.set_register(fields.rd, difference);
    Ok(())
}

pub fn mul(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let lhs = i64::from(ctx.state.register(fields.rs));
    let rhs = i64::from(ctx.state.register(fields.rt));
    ctx.state.set_register(fields.rd, (lhs * rhs) as i32);
    Ok(())
}

pub fn and(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let value = ctx.state.register(fields.rs) & ctx.state.register(fields.rt);
    ctx.state.set_register(fields.rd, value);
    Ok(())
}

pub fn or(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let value = ctx.state.register(fields.rs) | ctx.state.register(fields.rt);
    ctx.state.set_register(fields.rd, value);
    Ok(())
}

pub fn slt(ctx: &mut Context<'_>, fields: RFields) -> Result<()> {
    let less = ctx.state.register(fields.rs) < ctx.state.register(fields.rt);
    ctx.state.set_register(fields.rd, i32::from(less));
    Ok(())
}

/// Target inside the current 256MB region.
fn jump_target(ctx: &Context<'_>, fields: JFields) -> u32 {
    (ctx.state.pc() & 0xF000_0000) | (fields.target << 2)
}

pub fn j(ctx: &mut Context<'_>, fields: JFields) -> Result<()> {
    let target = jump_target(ctx, fields);
    ctx.state.jump(target);
    Ok(())
}

pub fn jal(ctx: &mut Context<'_>, fields: JFields) -> Result<()> {
    let target = jump_target(ctx, fields);
    ctx.state.link(Register::RA);
    ctx.state.jump(target);
    Ok(())
}

pub fn beq(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    if ctx.state.register(fields.rs) == ctx.state.register(fields.rt) {
        ctx.state.branch(fields.simm());
    }
    Ok(())
}

pub fn bne(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    if ctx.state.register(fields.rs) != ctx.state.register(fields.rt) {
        ctx.state.branch(fields.simm());
    }
    Ok(())
}

pub fn addi(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let sum = add_checked("addi", ctx.state.register(fields.rs), fields.simm())?;
    ctx.state.set_register(fields.rt, sum);
    Ok(())
}

pub fn lw(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let address = effective_address(ctx, fields);
    let value = ctx.state.read_word(address)?;
    ctx.state.set_register(fields.rt, value);
    Ok(())
}

pub fn sw(ctx: &mut Context<'_>, fields: IFields) -> Result<()> {
    let address = effective_address(ctx, fields);
    let value = ctx.state.register(fields.rt);
    ctx.state.write_word(address, value)?;
    Ok(())
}
