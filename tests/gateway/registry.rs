//! Static module registry as seen from outside the crate

use modgate::module::{
    find_static_module, resolve_get_api, static_get_api_name, static_modules, ModuleApiVersion,
};

#[test]
fn test_test_module_is_registered() {
    let entry = find_static_module("instrumented").expect("registered by the test harness");
    assert_eq!(entry.symbol, "GetApi_instrumented");
    assert_eq!(static_get_api_name("instrumented"), entry.symbol);
}

#[test]
fn test_builtins_are_visible_to_dependents() {
    let names: Vec<_> = static_modules().iter().map(|entry| entry.name).collect();
    assert!(names.contains(&"logger"));
    assert!(names.contains(&"hello_world"));
    assert!(names.contains(&"instrumented"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_resolve_by_symbol() {
    let get_api = resolve_get_api("GetApi_instrumented").unwrap();
    let table = get_api(ModuleApiVersion::V1).unwrap();
    assert_eq!(table.version(), ModuleApiVersion::V1);
    assert!(resolve_get_api("instrumented").is_none());
    assert!(resolve_get_api("GetApi_missing").is_none());
}
