// ==========================================
// 灯具项目ERP - 定价计算
// ==========================================
// 全部金额运算走 Decimal 精确计算, 不经过浮点
// ==========================================

use crate::config::EngineSettings;
use rust_decimal::Decimal;

/// 成交总价公式
///
/// final_price = unit_price * quantity * (1 + markup_pct / 100)
///
/// 该恒等式是 BOQ 明细的核心不变量, 任何改价/加价操作后都必须重算
pub fn final_price(unit_price: Decimal, quantity: i64, markup_pct: Decimal) -> Decimal {
    let factor = Decimal::ONE + markup_pct / Decimal::from(100);
    unit_price * Decimal::from(quantity) * factor
}

/// 线性灯具外置驱动数量推导
///
/// 每 run_length_m 米安装长度配一个驱动, 总长向上取整:
/// driver_qty = max(下限, ceil(quantity * length_mm / (run_length_m * 1000)))
pub fn derive_driver_quantity(
    product_quantity: i64,
    length_mm: i64,
    settings: &EngineSettings,
) -> i64 {
    let denom_mm = settings.driver_run_length_m * 1000;
    let total_mm = product_quantity * length_mm;
    let derived = (total_mm + denom_mm - 1) / denom_mm;
    derived.max(settings.min_driver_quantity)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_final_price_no_markup() {
        assert_eq!(final_price(dec!(100.50), 4, Decimal::ZERO), dec!(402.00));
    }

    #[test]
    fn test_final_price_with_markup() {
        // 100 * 10 * 1.15 = 1150
        assert_eq!(final_price(dec!(100), 10, dec!(15)), dec!(1150));
    }

    #[test]
    fn test_final_price_fractional_markup() {
        // 200 * 3 * 1.125 = 675
        assert_eq!(final_price(dec!(200), 3, dec!(12.5)), dec!(675.000));
    }

    #[test]
    fn test_derive_driver_quantity_exact_multiple() {
        let settings = EngineSettings::default();
        // 10件 * 1000mm = 10m, 每5m一个 -> 2
        assert_eq!(derive_driver_quantity(10, 1000, &settings), 2);
    }

    #[test]
    fn test_derive_driver_quantity_rounds_up() {
        let settings = EngineSettings::default();
        // 7件 * 1200mm = 8.4m -> ceil(8.4/5) = 2
        assert_eq!(derive_driver_quantity(7, 1200, &settings), 2);
        // 11件 * 2300mm = 25.3m -> ceil(25.3/5) = 6
        assert_eq!(derive_driver_quantity(11, 2300, &settings), 6);
    }

    #[test]
    fn test_derive_driver_quantity_floor_of_one() {
        let settings = EngineSettings::default();
        // 1件 * 300mm = 0.3m -> ceil 给 1, 下限也是 1
        assert_eq!(derive_driver_quantity(1, 300, &settings), 1);
    }

    #[test]
    fn test_derive_driver_quantity_custom_run_length() {
        let settings = EngineSettings {
            driver_run_length_m: 2,
            min_driver_quantity: 1,
        };
        // 3件 * 1500mm = 4.5m, 每2m一个 -> 3
        assert_eq!(derive_driver_quantity(3, 1500, &settings), 3);
    }
}
