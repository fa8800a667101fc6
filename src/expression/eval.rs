use std::f64::consts::{E, PI, TAU};

use crate::expression::ast::{BinaryOp, Expr};
use crate::expression::error::ExprError;
use crate::expression::parser::parse_expr;

/// Evaluate angle text such as `"pi/30"` or `"-deg(90)"` to radians.
pub fn eval_angle(src: &str) -> Result<f64, ExprError> {
    let expr = parse_expr(src)?;
    let v = eval(&expr)?;
    if !v.is_finite() {
        return Err(ExprError::new(0, format!("expression evaluated to {v}")));
    }
    Ok(v)
}

fn eval(e: &Expr) -> Result<f64, ExprError> {
    match e {
        Expr::Num(v) => Ok(*v),
        Expr::Ident { name, offset } => constant(name)
            .ok_or_else(|| ExprError::new(*offset, format!("unknown constant '{name}'"))),
        Expr::Neg(inner) => Ok(-eval(inner)?),
        Expr::Binary {
            op,
            left,
            right,
            offset,
        } => {
            let a = eval(left)?;
            let b = eval(right)?;
            match op {
                BinaryOp::Add => Ok(a + b),
                BinaryOp::Sub => Ok(a - b),
                BinaryOp::Mul => Ok(a * b),
                BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
                    Err(ExprError::new(*offset, "division by zero"))
                }
                BinaryOp::Div => Ok(a / b),
                BinaryOp::Mod => Ok(a % b),
            }
        }
        Expr::Call { func, args, offset } => {
            let values = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            call_builtin(func, &values, *offset)
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(PI),
        "tau" | "TAU" => Some(TAU),
        "e" | "E" => Some(E),
        _ => None,
    }
}

fn call_builtin(func: &str, args: &[f64], offset: usize) -> Result<f64, ExprError> {
    let arity = |n: usize| -> Result<(), ExprError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(ExprError::new(
                offset,
                format!("{func} expects {n} arg(s), got {}", args.len()),
            ))
        }
    };

    match func {
        "sin" => arity(1).map(|_| args[0].sin()),
        "cos" => arity(1).map(|_| args[0].cos()),
        "tan" => arity(1).map(|_| args[0].tan()),
        "abs" => arity(1).map(|_| args[0].abs()),
        "deg" => arity(1).map(|_| args[0].to_radians()),
        "sqrt" => {
            arity(1)?;
            if args[0] < 0.0 {
                return Err(ExprError::new(offset, "sqrt of a negative number"));
            }
            Ok(args[0].sqrt())
        }
        "min" => arity(2).map(|_| args[0].min(args[1])),
        "max" => arity(2).map(|_| args[0].max(args[1])),
        _ => Err(ExprError::new(offset, format!("unknown function '{func}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn evaluates_common_angle_forms() {
        assert!(close(eval_angle("pi/30").unwrap(), PI / 30.0));
        assert!(close(eval_angle("pi / 2").unwrap(), PI / 2.0));
        assert!(close(eval_angle("2*pi/3").unwrap(), 2.0 * PI / 3.0));
        assert!(close(eval_angle("-pi/2").unwrap(), -PI / 2.0));
        assert!(close(eval_angle("0.1").unwrap(), 0.1));
        assert!(close(eval_angle("=tau/4").unwrap(), PI / 2.0));
    }

    #[test]
    fn evaluates_builtins() {
        assert!(close(eval_angle("deg(6)").unwrap(), PI / 30.0));
        assert!(close(eval_angle("max(1, 2) - min(1, 2)").unwrap(), 1.0));
        assert!(close(eval_angle("sqrt(4)*abs(-1)").unwrap(), 2.0));
        assert!(close(eval_angle("7 % 4").unwrap(), 3.0));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(eval_angle("foo").is_err());
        assert!(eval_angle("pi/0").is_err());
        assert!(eval_angle("sin(1, 2)").is_err());
        assert!(eval_angle("sqrt(-1)").is_err());
        assert!(eval_angle("bogus(1)").is_err());
        assert!(eval_angle("1e400").is_err());
    }

    #[test]
    fn error_offsets_point_at_the_problem() {
        let err = eval_angle("pi/0").unwrap_err();
        assert_eq!(err.offset, 2);
        let err = eval_angle("2*foo").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
