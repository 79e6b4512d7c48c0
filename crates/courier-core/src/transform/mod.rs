//! 代表性的转换处理单元。
//!
//! - [`SetBodyProcessor`]：以表达式结果替换当前消息的消息体，替换时新建默认消息承载；
//! - [`SetHeaderProcessor`]：以表达式结果设置当前消息的 Header，原地修改。
//!
//! 两者都不会挂起：求值失败附着到交换上后同步完成。

mod set_body;
mod set_header;

pub use set_body::SetBodyProcessor;
pub use set_header::SetHeaderProcessor;
