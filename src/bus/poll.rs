/// Spin until `ready` returns true.
///
/// There is no timeout: a peripheral that never becomes ready blocks
/// forever, exactly like polling a status flag on the target.
pub fn wait_until<F>(mut ready: F)
where
	F: FnMut() -> bool,
{
	while !ready() {
	}
}
