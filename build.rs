#![allow(clippy::indexing_slicing, clippy::exit, clippy::unwrap_used)]

/// Build identifiers accepted in `HW_PROFILE`. Kept in sync with
/// `ProfileId::from_name` in `src/registry.rs`.
const KNOWN_PROFILES: &[&str] = &[
    "ESP32_TZT_24",
    "ESP32-TZT-2.4",
    "ESP32_2432S028R",
    "ESP32-2432S028R",
    "ESP32_GENERIC",
    "ESP32-Generic",
];

fn main() {
    // Re-invoked by the linker with the failing symbol as arguments.
    if std::env::args().len() > 1 {
        linker_be_nice();
    }

    println!("cargo:rerun-if-env-changed=HW_PROFILE");
    check_profile_selection();

    if std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default() != "xtensa" {
        return;
    }

    if std::env::var("PROFILE").unwrap_or_default() == "release" {
        println!("cargo:rustc-env=DEFMT_LOG=off");
    }

    linker_be_nice();
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

fn check_profile_selection() {
    let Ok(selected) = std::env::var("HW_PROFILE") else {
        println!(
            "cargo:warning=HW_PROFILE not set, ESP32_TZT_24 is used as the default hardware profile"
        );
        return;
    };

    if !KNOWN_PROFILES.contains(&selected.trim()) {
        eprintln!();
        eprintln!("💡 Unknown HW_PROFILE `{selected}`. Supported profiles: ESP32_TZT_24, ESP32_2432S028R, ESP32_GENERIC");
        eprintln!();
        std::process::exit(1);
    }
}

fn linker_be_nice() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        let kind = &args[1];
        let what = &args[2];

        match kind.as_str() {
            "undefined-symbol" => match what.as_str() {
                "_defmt_timestamp" => {
                    eprintln!();
                    eprintln!(
                        "💡 `defmt` not found - make sure `defmt.x` is added as a linker script and you have included `use defmt_rtt as _;`"
                    );
                    eprintln!();
                }
                "_stack_start" => {
                    eprintln!();
                    eprintln!("💡 Is the linker script `linkall.x` missing?");
                    eprintln!();
                }
                "esp_rtos_initialized" | "esp_rtos_yield_task" | "esp_rtos_task_create" => {
                    eprintln!();
                    eprintln!(
                        "💡 `esp-rtos` scheduler missing. Make sure `esp_rtos::start` is called before spawning tasks."
                    );
                    eprintln!();
                }
                _ => (),
            },
            _ => {
                std::process::exit(1);
            }
        }

        std::process::exit(0);
    }

    println!(
        "cargo:rustc-link-arg=-Wl,--error-handling-script={}",
        std::env::current_exe().unwrap().display()
    );
}
