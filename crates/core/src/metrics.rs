//! 메트릭 상수 및 설명 등록
//!
//! 러너가 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//!
//! 이 크레이트는 `metrics` 매크로로 기록만 하고 레코더나 익스포터를 설치하지 않습니다.
//! `hookline` 바이너리도 설치하지 않으므로 CLI 실행에서는 기록이 no-op입니다.
//! 메트릭을 수집하려면 임베더가 전역 레코더(예: `metrics-exporter-prometheus`)를
//! 설치한 뒤 [`describe_all`]을 한 번 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `hookline_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```
//! use metrics::counter;
//!
//! // 레코더 설치 후
//! hookline_core::metrics::describe_all();
//! counter!(hookline_core::metrics::TESTS_TOTAL, "status" => "passed").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 테스트 상태 레이블 키 (passed, failed, skipped)
pub const LABEL_STATUS: &str = "status";

/// 생명주기 단계 레이블 키 (before-all, before-each, after-each, after-all)
pub const LABEL_PHASE: &str = "phase";

// ─── 러너 메트릭 ────────────────────────────────────────────────────

/// 실행 완료된 테스트 케이스 수 (counter, label: status)
pub const TESTS_TOTAL: &str = "hookline_tests_total";

/// 실행된 hook 수 (counter, label: phase)
pub const HOOKS_EXECUTED_TOTAL: &str = "hookline_hooks_executed_total";

/// 실패한 hook 수 (counter, label: phase)
pub const HOOK_FAILURES_TOTAL: &str = "hookline_hook_failures_total";

/// 실행된 스위트 수 (counter)
pub const SUITES_TOTAL: &str = "hookline_suites_total";

/// 스위트 전체 소요 시간 (histogram, 초)
pub const SUITE_DURATION_SECONDS: &str = "hookline_suite_duration_seconds";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        TESTS_TOTAL,
        "Total number of test cases finished, by final status"
    );
    describe_counter!(
        HOOKS_EXECUTED_TOTAL,
        "Total number of lifecycle hooks executed, by phase"
    );
    describe_counter!(
        HOOK_FAILURES_TOTAL,
        "Total number of lifecycle hooks that failed, by phase"
    );
    describe_counter!(SUITES_TOTAL, "Total number of suites run");
    describe_histogram!(
        SUITE_DURATION_SECONDS,
        "Wall-clock time to run a whole suite in seconds"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        TESTS_TOTAL,
        HOOKS_EXECUTED_TOTAL,
        HOOK_FAILURES_TOTAL,
        SUITES_TOTAL,
        SUITE_DURATION_SECONDS,
    ];

    #[test]
    fn all_metrics_start_with_hookline_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("hookline_"),
                "Metric '{}' does not start with 'hookline_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 없어도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_STATUS, LABEL_PHASE] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
