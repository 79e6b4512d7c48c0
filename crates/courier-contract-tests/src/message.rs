use crate::case::{TckCase, TckSuite};
use crate::verify::verify_copy_from;
use courier_core::{Attachment, DefaultMessage, HeaderCase, Message, Value};

const CASES: &[TckCase] = &[
    TckCase {
        name: "copy_from_adopts_metadata_and_keeps_body",
        test: copy_from_adopts_metadata_and_keeps_body,
    },
    TckCase {
        name: "copy_from_shares_attachments",
        test: copy_from_shares_attachments,
    },
    TckCase {
        name: "header_case_policy_is_fixed_at_construction",
        test: header_case_policy_is_fixed_at_construction,
    },
    TckCase {
        name: "body_accepts_any_type",
        test: body_accepts_any_type,
    },
];

const SUITE: TckSuite = TckSuite {
    name: "message",
    cases: CASES,
};

/// 返回“消息”主题的测试套件。
pub const fn suite() -> &'static TckSuite {
    &SUITE
}

fn copy_from_adopts_metadata_and_keeps_body() {
    verify_copy_from(DefaultMessage::new());
    verify_copy_from(DefaultMessage::with_header_case(HeaderCase::Sensitive));
}

fn copy_from_shares_attachments() {
    let mut donor = DefaultMessage::new();
    donor
        .attachments_mut()
        .insert("report", Attachment::new(vec![1_u8, 2, 3]).with_content_type("application/pdf"));

    let mut receiver = DefaultMessage::new();
    receiver.copy_from(&donor);

    let copied = receiver.attachments().get("report").expect("附件应被复制");
    let original = donor.attachments().get("report").expect("捐赠方附件不变");
    assert_eq!(copied.data().as_ptr(), original.data().as_ptr(), "附件数据应共享而非深拷贝");
    assert_eq!(copied.content_type(), Some("application/pdf"));
}

fn header_case_policy_is_fixed_at_construction() {
    let insensitive = DefaultMessage::new().with_header("Content-Type", "text/plain");
    assert!(insensitive.header("content-type").is_some());
    let names: Vec<_> = insensitive.headers().iter().map(|(name, _)| name.to_owned()).collect();
    assert_eq!(names, ["Content-Type"], "应保留首次写入时的拼写");

    let sensitive =
        DefaultMessage::with_header_case(HeaderCase::Sensitive).with_header("Content-Type", "text/plain");
    assert!(sensitive.header("content-type").is_none());
    assert!(sensitive.header("Content-Type").is_some());
}

fn body_accepts_any_type() {
    #[derive(Debug, PartialEq)]
    struct Order {
        id: u32,
    }

    let mut message = DefaultMessage::new();
    message.set_body(Value::new(Order { id: 7 }));
    let dyn_message: &dyn Message = &message;
    assert_eq!(dyn_message.body_as::<Order>(), Some(&Order { id: 7 }));
    assert!(dyn_message.body_as::<String>().is_none(), "类型不符只返回 None，不报错");

    let taken = message.take_body().expect("消息体存在");
    assert!(taken.is::<Order>());
    assert!(message.body().is_none());
}
