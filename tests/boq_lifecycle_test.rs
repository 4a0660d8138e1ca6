// ==========================================
// 集成测试 - BOQ 生命周期 (审批/加价/改价)
// ==========================================


use lighting_erp::api::{ApiError, ConfigurationProductInput};
use lighting_erp::domain::types::{BoqStatus, InquiryType};
use lighting_erp::engine::BoqLifecycleEngine;
use lighting_erp::repository::RepositoryError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_helpers::*;

/// 固定场景: 单区域单产品 (数量5, 单价500), 返回 boq_id
fn generate_simple_boq(ctx: &TestContext) -> String {
    seed_project(ctx, "P1", InquiryType::AreaWise);
    seed_area(ctx, "A1", "P1");
    seed_product(ctx, "PR1", dec!(500));

    ctx.configuration_api
        .create_configuration_version(
            "P1",
            Some("A1"),
            None,
            &[ConfigurationProductInput {
                product_id: "PR1".to_string(),
                quantity: 5,
                driver_id: None,
                driver_quantity: None,
                accessories: vec![],
            }],
            "tester",
        )
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap().boq.boq_id
}

#[test]
fn test_apply_margin_recomputes_final_prices() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    ctx.boq_api
        .apply_margin_to_boq(&boq_id, dec!(10), "tester")
        .unwrap();

    let items = ctx.boq_api.get_boq_items(&boq_id).unwrap();
    assert_eq!(items.len(), 1);
    // 500 * 5 * 1.10 = 2750
    assert_eq!(items[0].markup_pct, dec!(10));
    assert_eq!(items[0].final_price, dec!(2750));
}

#[test]
fn test_apply_margin_on_final_boq_rejected_and_prices_unchanged() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();
    let before = ctx.boq_api.get_boq_items(&boq_id).unwrap();

    let err = ctx
        .boq_api
        .apply_margin_to_boq(&boq_id, dec!(10), "tester")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let after = ctx.boq_api.get_boq_items(&boq_id).unwrap();
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.markup_pct, a.markup_pct);
        assert_eq!(b.final_price, a.final_price);
    }
}

#[test]
fn test_negative_margin_rejected() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    let err = ctx
        .boq_api
        .apply_margin_to_boq(&boq_id, dec!(-3), "tester")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_approve_sets_final_and_locked_at() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    let approved = ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();
    assert_eq!(approved.status, BoqStatus::Final);
    assert!(approved.locked_at.is_some());

    // 落库回读一致
    let stored = ctx.boq_repo.find_by_id(&boq_id).unwrap().unwrap();
    assert_eq!(stored.status, BoqStatus::Final);
    assert!(stored.locked_at.is_some());
}

#[test]
fn test_approve_is_not_idempotent() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();
    // 第二次审批必须报错, 不允许静默成功
    let err = ctx.boq_api.approve_boq(&boq_id, "tester").unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_status_guard_blocks_stale_transition() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();

    // 模拟并发竞争中迟到的一方: 引擎预检已过期, 仓储守卫必须拦下
    let now = chrono::Local::now().naive_local();
    let err = ctx
        .boq_repo
        .update_status(&boq_id, BoqStatus::Draft, BoqStatus::Final, Some(now))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));

    // 锁定时间未被迟到方覆盖
    let stored = ctx.boq_repo.find_by_id(&boq_id).unwrap().unwrap();
    assert_eq!(stored.status, BoqStatus::Final);
}

#[test]
fn test_price_override_keeps_markup_and_captures_old_values() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    ctx.boq_api
        .apply_margin_to_boq(&boq_id, dec!(20), "tester")
        .unwrap();
    let item_id = ctx.boq_api.get_boq_items(&boq_id).unwrap()[0].item_id.clone();

    let result = ctx
        .boq_api
        .update_item_price(&item_id, dec!(400), "tester")
        .unwrap();

    // 改价前快照
    assert_eq!(result.old_unit_price, dec!(500));
    assert_eq!(result.old_final_price, dec!(3000)); // 500*5*1.20
    // 改价后: 400 * 5 * 1.20 = 2400, 加价比例保留
    assert_eq!(result.item.unit_price, dec!(400));
    assert_eq!(result.item.markup_pct, dec!(20));
    assert_eq!(result.item.final_price, dec!(2400));

    let stored = ctx.boq_repo.find_item_by_id(&item_id).unwrap().unwrap();
    assert_eq!(stored.final_price, dec!(2400));
}

#[test]
fn test_price_override_on_final_boq_rejected() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);
    let item_id = ctx.boq_api.get_boq_items(&boq_id).unwrap()[0].item_id.clone();

    ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();
    let err = ctx
        .boq_api
        .update_item_price(&item_id, dec!(400), "tester")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_negative_price_rejected() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);
    let item_id = ctx.boq_api.get_boq_items(&boq_id).unwrap()[0].item_id.clone();

    let err = ctx
        .boq_api
        .update_item_price(&item_id, dec!(-1), "tester")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_final_price_invariant_after_every_mutation() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    let check_invariant = |label: &str| {
        for item in ctx.boq_api.get_boq_items(&boq_id).unwrap() {
            let expected = item.unit_price
                * Decimal::from(item.quantity)
                * (Decimal::ONE + item.markup_pct / Decimal::from(100));
            assert_eq!(item.final_price, expected, "不变量被破坏于: {label}");
        }
    };

    check_invariant("生成后");
    ctx.boq_api
        .apply_margin_to_boq(&boq_id, dec!(12.5), "tester")
        .unwrap();
    check_invariant("加价后");

    let item_id = ctx.boq_api.get_boq_items(&boq_id).unwrap()[0].item_id.clone();
    ctx.boq_api
        .update_item_price(&item_id, dec!(123.45), "tester")
        .unwrap();
    check_invariant("改价后");
}

#[test]
fn test_export_gating_follows_status() {
    let ctx = setup();
    let boq_id = generate_simple_boq(&ctx);

    let draft = ctx.boq_repo.find_by_id(&boq_id).unwrap().unwrap();
    assert!(BoqLifecycleEngine::ensure_excel_exportable(&draft).is_err());
    assert!(BoqLifecycleEngine::pdf_requires_draft_watermark(&draft));

    ctx.boq_api.approve_boq(&boq_id, "tester").unwrap();
    let locked = ctx.boq_repo.find_by_id(&boq_id).unwrap().unwrap();
    assert!(BoqLifecycleEngine::ensure_excel_exportable(&locked).is_ok());
    assert!(!BoqLifecycleEngine::pdf_requires_draft_watermark(&locked));
}
