use std::str::FromStr;

/// parse the value of option `name`; fails if it is missing or invalid
pub fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> crate::AResult<T>
where
	T: FromStr,
	failure::Error: From<<T as FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

// `default` if the option wasn't given at all
pub fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: T) -> crate::AResult<T>
where
	T: FromStr,
	failure::Error: From<<T as FromStr>::Err>,
{
	if matches.value_of(name).is_none() {
		return Ok(default);
	}
	get_param(matches, name)
}
