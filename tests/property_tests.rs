//! Property-based tests over the domain value objects and cap arithmetic.
//! Generators stay in bounded ranges so `Decimal` arithmetic never
//! overflows; that bound is intentionally far above any real payroll
//! figure.

use proptest::prelude::*;
use rust_decimal::Decimal;

use sicoss_core::config::SicossConfig;
use sicoss_core::domain::fiscal_period::FiscalPeriod;
use sicoss_core::domain::legajo::{EmployeeId, RegimeChar};
use sicoss_core::domain::record::{SicossRecord, MONETARY_MAX, MONETARY_MIN};
use sicoss_core::domain::GroupTagSet;
use sicoss_core::sicoss::aggregator;
use sicoss_core::sicoss::cap_engine::apply_caps;

fn cents(v: i64) -> Decimal {
    Decimal::new(v, 2)
}

fn record_with_bases(a: i64, b: i64, c: i64) -> SicossRecord {
    SicossRecord {
        periodo_fiscal: "202401".parse().unwrap(),
        nro_legaj: EmployeeId(1),
        cuil: "20123456789".to_string(),
        apnom: "PEREZ, JUAN".to_string(),
        conyuge: false,
        cant_hijos: 0,
        cant_adh: 0,
        cod_situacion: 1,
        cod_cond: 1,
        cod_act: 0,
        cod_zona: 1,
        porc_aporte: Decimal::ZERO,
        cod_mod_cont: 1,
        cod_os: 101,
        rem_total: cents(a),
        rem_impo1: cents(a),
        rem_impo2: cents(a),
        rem_impo3: cents(a),
        rem_impo4: cents(b),
        rem_impo5: cents(b),
        rem_impo6: cents(a),
        rem_impo7: cents(a),
        rem_impo8: Decimal::ZERO,
        rem_impo9: cents(c),
        sac: Decimal::ZERO,
        no_remun: Decimal::ZERO,
        tipo_de_operacion: 1,
        prioridad_tipo_de_actividad: 1,
        trabajador_convencionado: RegimeChar('0'),
        sit_rev1: 1,
        sit_rev2: 0,
        sit_rev3: 0,
        dia_ini_sit_rev1: None,
        dia_ini_sit_rev2: None,
        dia_ini_sit_rev3: None,
        asignaciones_familiares: Decimal::ZERO,
        informar_becarios: false,
        art_con_tope: false,
        conceptos_no_remun_en_art: false,
        porc_aporte_adicional_jubilacion: Decimal::ZERO,
        tope_superado: false,
        tope_excedente: Decimal::ZERO,
        differential_category_applied: false,
        valid: true,
        exclusion_reason: None,
        fecha_procesamiento: chrono::Utc::now(),
        version_sistema: "test".to_string(),
        metodo_procesamiento: "test".to_string(),
    }
}

proptest! {
    /// A truncating CapEngine run never increases any of the three capped
    /// bases above their pre-run value.
    #[test]
    fn capping_never_increases_bases(
        a in 0i64..5_000_000_00,
        b in 0i64..5_000_000_00,
        c in 0i64..5_000_000_00,
        cap in 0i64..5_000_000_00,
    ) {
        let config = SicossConfig {
            tope_jubilatorio_patronal: cents(cap),
            tope_jubilatorio_personal: cents(cap),
            tope_otros_aportes_personales: cents(cap),
            ..SicossConfig::default()
        };
        let before = record_with_bases(a, b, c);
        let pre_impo1 = before.rem_impo1;
        let pre_impo3 = before.rem_impo3;
        let after = apply_caps(before, None, &config).unwrap();
        prop_assert!(after.rem_impo1 <= pre_impo1);
        prop_assert!(after.rem_impo3 <= pre_impo3);
    }

    /// Running the CapEngine twice in a row is the same as running it once:
    /// a record that has already settled is a fixed point.
    #[test]
    fn capping_is_idempotent(
        a in 0i64..5_000_000_00,
        b in 0i64..5_000_000_00,
        c in 0i64..5_000_000_00,
        cap in 1i64..5_000_000_00,
    ) {
        let config = SicossConfig {
            tope_jubilatorio_patronal: cents(cap),
            tope_jubilatorio_personal: cents(cap),
            tope_otros_aportes_personales: cents(cap),
            ..SicossConfig::default()
        };
        let once = apply_caps(record_with_bases(a, b, c), None, &config).unwrap();
        let twice = apply_caps(once.clone(), None, &config).unwrap();
        prop_assert_eq!(once.rem_impo1, twice.rem_impo1);
        prop_assert_eq!(once.rem_impo3, twice.rem_impo3);
        prop_assert_eq!(once.rem_impo4, twice.rem_impo4);
        prop_assert_eq!(once.rem_impo9, twice.rem_impo9);
    }

    /// Reporting-only mode (`trunca_tope = false`) never changes a base,
    /// regardless of how far over the cap it is.
    #[test]
    fn reporting_only_mode_never_truncates(
        a in 0i64..5_000_000_00,
        cap in 0i64..5_000_000_00,
    ) {
        let config = SicossConfig {
            tope_jubilatorio_patronal: cents(cap),
            trunca_tope: false,
            ..SicossConfig::default()
        };
        let before = record_with_bases(a, 0, 0);
        let pre = before.rem_impo3;
        let after = apply_caps(before, None, &config).unwrap();
        prop_assert_eq!(after.rem_impo3, pre);
    }

    /// The Aggregator's reduction is invariant to how the roster is split
    /// into chunks before folding.
    #[test]
    fn aggregation_is_partition_invariant(amounts in prop::collection::vec(0i64..1_000_000_00, 1..40), split in 0usize..40) {
        let records: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amt)| {
                let mut r = record_with_bases(amt, amt, amt);
                r.nro_legaj = EmployeeId(i as i64);
                r
            })
            .collect();
        let split = split.min(records.len());

        let whole = aggregator::aggregate(&records);
        let (left, right) = records.split_at(split);
        let partitioned = aggregator::aggregate(left).combine(aggregator::aggregate(right));

        prop_assert_eq!(whole, partitioned);
    }

    /// `GroupTagSet::new` always yields a strictly increasing sequence,
    /// regardless of the input's order or duplicates.
    #[test]
    fn group_tag_set_is_always_sorted_and_deduped(tags in prop::collection::vec(0u8..60, 0..30)) {
        let set = GroupTagSet::new(tags);
        let collected: Vec<u8> = set.iter().collect();
        for window in collected.windows(2) {
            prop_assert!(window[0] < window[1]);
        }
    }

    /// Any valid year/month pair round-trips through the canonical
    /// `YYYYMM` string form.
    #[test]
    fn fiscal_period_round_trips(year in 1990u16..2100, month in 1u8..=12) {
        let period = FiscalPeriod::new(year, month).unwrap();
        let parsed: FiscalPeriod = period.canonical().parse().unwrap();
        prop_assert_eq!(period, parsed);
    }

    /// `clamp_monetary` always leaves every monetary field inside
    /// `[MONETARY_MIN, MONETARY_MAX]`, no matter how far out of band the
    /// input was.
    #[test]
    fn clamp_monetary_always_settles_into_band(a in -1_000_000_000_00i64..1_000_000_000_00i64) {
        let mut record = record_with_bases(a, a, a);
        record.clamp_monetary();
        for value in [
            record.rem_total, record.rem_impo1, record.rem_impo2, record.rem_impo3,
            record.rem_impo4, record.rem_impo5, record.rem_impo6, record.rem_impo7,
            record.rem_impo8, record.rem_impo9, record.sac, record.no_remun,
        ] {
            prop_assert!(value >= MONETARY_MIN);
            prop_assert!(value <= MONETARY_MAX);
        }
    }
}
