//! Module export macro

/// Export a [`Module`](crate::module::Module) type as a statically linked module
///
/// Generates the module's static V1 table, its GetApi entry point, an
/// `extern "C"` symbol named `GetApi_<name>` and a registry entry so the host
/// can find the module by name.
///
/// ```rust,ignore
/// modgate::module_api!(Echo, echo);               // no Start entry
/// modgate::module_api!(Ticker, ticker, startable); // with Start
/// ```
#[macro_export]
macro_rules! module_api {
    (@export $name:ident, $table:expr) => {
        const _: () = {
            static TABLES: [$crate::module::ModuleApiTable; 1] =
                [$crate::module::ModuleApiTable::V1($table)];

            fn get_api(
                requested: $crate::module::ModuleApiVersion,
            ) -> ::std::option::Option<&'static $crate::module::ModuleApiTable> {
                $crate::module::select_table(requested, &TABLES)
            }

            #[export_name = concat!("GetApi_", stringify!($name))]
            #[allow(improper_ctypes_definitions)]
            extern "C" fn get_api_raw(requested: u32) -> *const $crate::module::ModuleApiTable {
                match get_api($crate::module::ModuleApiVersion::new(requested)) {
                    ::std::option::Option::Some(table) => table as *const _,
                    ::std::option::Option::None => ::std::ptr::null(),
                }
            }

            $crate::inventory::submit! {
                $crate::module::StaticModuleEntry {
                    name: stringify!($name),
                    symbol: concat!("GetApi_", stringify!($name)),
                    get_api,
                    get_api_raw,
                }
            }
        };
    };
    ($module:ty, $name:ident) => {
        $crate::module_api!(@export $name, $crate::module::ModuleApiV1::of::<$module>());
    };
    ($module:ty, $name:ident, startable) => {
        $crate::module_api!(@export $name, $crate::module::ModuleApiV1::of_startable::<$module>());
    };
}
