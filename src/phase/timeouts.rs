// ABOUTME: Expression rendering helpers with compiled-in default fallbacks.
// ABOUTME: A non-positive or unparsable timeout never reaches the dispatcher.

use std::time::Duration;

use crate::context::ExecutionContext;

/// Render a timeout expression (in minutes) or fall back to the default.
///
/// Falls back when the expression is absent, renders to something
/// non-numeric, or renders to a non-positive value.
pub fn render_timeout_or_default(
    ctx: &dyn ExecutionContext,
    expr: Option<&str>,
    default: Duration,
) -> Duration {
    let Some(expr) = expr else {
        return default;
    };

    let rendered = ctx.render_expression(expr);
    match rendered.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Duration::from_secs(minutes as u64 * 60),
        Ok(minutes) => {
            tracing::debug!(%rendered, minutes, "non-positive timeout, using default");
            default
        }
        Err(_) => {
            tracing::debug!(%rendered, "non-numeric timeout, using default");
            default
        }
    }
}

/// Render an integer expression or fall back to the default.
pub fn render_int_or_default(ctx: &dyn ExecutionContext, expr: &str, default: i64) -> i64 {
    let rendered = ctx.render_expression(expr);
    rendered.trim().parse::<i64>().unwrap_or_else(|_| {
        tracing::debug!(%rendered, default, "non-numeric expression, using default");
        default
    })
}

/// Render a floating-point expression or fall back to the default. Used for
/// traffic-shift percentages where the default is a sentinel the caller
/// checks.
pub fn render_double_or_default(ctx: &dyn ExecutionContext, expr: &str, default: f64) -> f64 {
    let rendered = ctx.render_expression(expr);
    rendered.trim().parse::<f64>().unwrap_or(default)
}
