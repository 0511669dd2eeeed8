use std::ffi::OsString;

use crate::config::WasiRuntimeConfig;

/// Interpreter flag requesting isolated mode (no site imports, no
/// environment-driven startup side effects).
const ISOLATED_FLAG: &str = "-I";

/// Build the argument list for one interpreter invocation (everything after
/// the runtime executable itself).
///
/// Layout: `run --env PYTHONUNBUFFERED=1 <extra...> <module> [-I] -c <code>`.
/// Arguments before the module path belong to the runtime, arguments after
/// it to the guest interpreter. No `--dir` preopen is ever passed, so the
/// guest sees an empty filesystem.
pub(crate) fn build_args(config: &WasiRuntimeConfig, code: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(config.extra_args.len() + 7);
    args.push("run".into());
    // Unbuffered guest output so partial lines survive a timeout kill.
    args.push("--env".into());
    args.push("PYTHONUNBUFFERED=1".into());
    for extra in &config.extra_args {
        args.push(extra.into());
    }
    args.push(config.module_path.clone().into_os_string());
    if config.isolated_mode {
        args.push(ISOLATED_FLAG.into());
    }
    args.push("-c".into());
    args.push(code.into());
    args
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sandbox::ResourceLimits;

    use super::*;

    fn config(extra_args: Vec<String>, isolated_mode: bool) -> WasiRuntimeConfig {
        WasiRuntimeConfig {
            runtime: "wasmtime".to_string(),
            module_path: PathBuf::from("/opt/python.wasm"),
            extra_args,
            isolated_mode,
            limits: ResourceLimits::default(),
        }
    }

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn minimal_invocation() {
        let args = build_args(&config(Vec::new(), false), "print('hi')");
        assert_eq!(
            as_strings(&args),
            vec![
                "run",
                "--env",
                "PYTHONUNBUFFERED=1",
                "/opt/python.wasm",
                "-c",
                "print('hi')",
            ]
        );
    }

    #[test]
    fn isolated_flag_goes_after_module() {
        let args = as_strings(&build_args(&config(Vec::new(), true), "1"));
        let module = args.iter().position(|a| a == "/opt/python.wasm").unwrap();
        let flag = args.iter().position(|a| a == "-I").unwrap();
        assert_eq!(flag, module + 1);
    }

    #[test]
    fn extra_args_go_before_module() {
        let extra = vec!["--wasm".to_string(), "max-memory=268435456".to_string()];
        let args = as_strings(&build_args(&config(extra, false), "1"));
        let module = args.iter().position(|a| a == "/opt/python.wasm").unwrap();
        let wasm_flag = args.iter().position(|a| a == "--wasm").unwrap();
        assert!(wasm_flag < module);
    }

    #[test]
    fn code_is_the_final_argument() {
        let code = "while True:\n    pass";
        let args = as_strings(&build_args(&config(Vec::new(), true), code));
        assert_eq!(args.last().map(String::as_str), Some(code));
        assert_eq!(args.get(args.len() - 2).map(String::as_str), Some("-c"));
    }

    #[test]
    fn never_preopens_host_directories() {
        let args = as_strings(&build_args(&config(Vec::new(), true), "import os"));
        assert!(args.iter().all(|a| a != "--dir" && !a.starts_with("--dir=")));
    }
}
