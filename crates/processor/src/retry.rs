//! 单次重试组合子

/// 操作结果及其是否经过重试
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T, E> {
    /// 第一次即成功
    First(T),
    /// 第一次失败，重试成功
    Retried { value: T, first_error: E },
}

/// 执行 `op`；若第一次的错误满足 `should_retry`，无条件再执行一次。
///
/// 重试的结果就是最终结果，不再检查其错误类型。
pub fn retry_once_on<T, E>(
    mut op: impl FnMut() -> Result<T, E>,
    should_retry: impl Fn(&E) -> bool,
) -> Result<Attempt<T, E>, E> {
    match op() {
        Ok(value) => Ok(Attempt::First(value)),
        Err(first_error) if should_retry(&first_error) => op().map(|value| Attempt::Retried {
            value,
            first_error,
        }),
        Err(e) => Err(e),
    }
}
