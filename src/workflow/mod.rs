pub mod member_ctx;
pub mod member_flow;

pub use member_ctx::MemberCtx;
pub use member_flow::{MemberFlow, StageOutcome};
