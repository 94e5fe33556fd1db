fn main() {
    println!("cargo:rerun-if-env-changed=CAMCLASSIFY_MODEL");

    // The classifier is embedded into the firmware image at build time.
    // Override with CAMCLASSIFY_MODEL=/path/to/model.cvm to flash a different export.
    let model = std::env::var("CAMCLASSIFY_MODEL").unwrap_or_else(|_| {
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
        format!("{manifest_dir}/models/classifier.cvm")
    });
    if !std::path::Path::new(&model).exists() {
        println!("cargo:warning=model artifact not found at {model}");
    }
    println!("cargo:rerun-if-changed={model}");
    println!("cargo:rustc-env=CAMCLASSIFY_MODEL={model}");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
