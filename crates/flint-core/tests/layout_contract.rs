//! `layout_contract` 集成测试：从外部 crate 视角验证共享配置与接收器契约。
//!
//! # 测试目标（Why）
//! - 层级表与布局是写读两端的协议根基，其校验规则属于对外承诺，
//!   必须在公开 API 层面锁定；
//! - 接收器契约要求对象安全且错误码稳定，此处以动态分发路径验证。

use bytes::BytesMut;
use flint_core::{ChainLayout, ChainSink, CoreError, SliceLevelTable, codes};

#[test]
fn default_layout_matches_documented_configuration() {
    let layout = ChainLayout::default();
    assert_eq!(layout.block_size(), 1 << 15);
    let levels = layout.levels();
    assert_eq!(levels.first_capacity(), 5);
    assert_eq!(levels.max_capacity(), 200);
    // 推进表逐级上行并在最高层饱和。
    let mut level = 0;
    for _ in 0..levels.len() * 2 {
        let next = levels.next(level);
        assert!(next >= level, "层级不允许回退");
        level = next;
    }
    assert_eq!(level, levels.len() - 1, "充分推进后应停留在最高层");
}

#[test]
fn invalid_configurations_carry_stable_error_code() {
    let cases: &[(Result<SliceLevelTable, CoreError>, &str)] = &[
        (SliceLevelTable::new(&[], &[]), "空表"),
        (SliceLevelTable::new(&[8], &[0, 0]), "长度不一致"),
        (SliceLevelTable::new(&[3], &[0]), "容量过小"),
        (SliceLevelTable::new(&[16, 8], &[1, 1]), "容量回退"),
    ];
    for (result, label) in cases {
        let err = result.as_ref().expect_err(label);
        assert_eq!(err.code(), codes::LAYOUT_INVALID, "{label}");
    }
}

#[test]
fn sinks_are_object_safe_and_order_preserving() {
    let mut vec_sink: Box<dyn ChainSink> = Box::new(Vec::<u8>::new());
    vec_sink.write_chunk(&[1, 2]).expect("Vec 接收器写入");
    vec_sink.write_chunk(&[3]).expect("Vec 接收器续写");

    let mut bytes_sink: Box<dyn ChainSink> = Box::new(BytesMut::new());
    bytes_sink.write_chunk(&[1, 2]).expect("BytesMut 接收器写入");
    bytes_sink.write_chunk(&[3]).expect("BytesMut 接收器续写");
}
