use sift_match::PipelineConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 SIFT Pipeline Configuration Serialization Demo");
    println!("==================================================\n");

    // Demo 1: Create configurations
    println!("📋 Demo 1: Creating Configurations");

    let strict = PipelineConfig::strict_preset()
        .with_metadata("Survey Strict", "Few, reliable matches for pose estimation")
        .with_seed(42);
    let permissive = PipelineConfig::permissive_preset()
        .with_metadata("Texture Permissive", "Repetitive facades and low-texture scenes");
    let custom = PipelineConfig::new().with_metadata("Custom Config", "Reference thresholds");

    println!("   Created 3 configurations:");
    println!("   • {}", strict.summary());
    println!("   • {}", permissive.summary());
    println!("   • {}", custom.summary());

    // Demo 2: JSON serialization
    println!("\n📄 Demo 2: JSON Serialization");
    let json = strict.to_json()?;
    println!("   Strict config JSON (first 200 chars):");
    println!("   {}", &json[..200.min(json.len())]);
    strict.save_json("strict_config.json")?;
    permissive.save_json("permissive_config.json")?;
    println!("   ✅ Saved 2 JSON configuration files");

    // Demo 3: TOML serialization
    println!("\n📋 Demo 3: TOML Serialization");
    let toml = permissive.to_toml()?;
    println!("   Permissive config TOML (first 300 chars):");
    println!("   {}", &toml[..300.min(toml.len())]);
    strict.save_toml("strict_config.toml")?;
    custom.save_toml("custom_config.toml")?;
    println!("   ✅ Saved 2 TOML configuration files");

    // Demo 4: Load and validate
    println!("\n🔍 Demo 4: Loading and Validation");
    let loaded_json = PipelineConfig::load("strict_config.json")?;
    let loaded_toml = PipelineConfig::load("custom_config.toml")?;
    println!("   • From JSON: {}", loaded_json.summary());
    println!("   • From TOML: {}", loaded_toml.summary());
    loaded_json.validate()?;
    loaded_toml.validate()?;
    println!("   ✅ All loaded configurations are valid");

    // Demo 5: Comparison table
    println!("\n📊 Demo 5: Configuration Comparison");
    let configs = [
        ("Default", PipelineConfig::new()),
        ("Strict", PipelineConfig::strict_preset()),
        ("Permissive", PipelineConfig::permissive_preset()),
    ];
    println!("   {:<12} {:<7} {:<8} {:<10} {:<7} {:<8}", "Name", "Ratio", "Samples", "Orient", "Scale", "Policy");
    println!("   {}", "-".repeat(58));
    for (name, config) in &configs {
        println!(
            "   {:<12} {:<7.2} {:<8} {:<10.3} {:<7.2} {:<8?}",
            name,
            config.core.ratio_threshold,
            config.core.sample_size,
            config.core.orientation_tolerance,
            config.core.scale_tolerance,
            config.candidate_policy
        );
    }

    // Demo 6: Invalid files are rejected on load
    println!("\n🚫 Demo 6: Validation on Load");
    let broken = custom.to_json()?.replace("\"sample_size\": 10", "\"sample_size\": 0");
    match PipelineConfig::from_json(&broken) {
        Ok(_) => println!("   ⚠️  Unexpectedly accepted sample_size = 0"),
        Err(err) => println!("   Rejected: {}", err),
    }

    // Demo 7: Round-trip
    println!("\n🔄 Demo 7: Round-trip Testing");
    let from_json = PipelineConfig::from_json(&strict.to_json()?)?;
    let from_toml = PipelineConfig::from_toml(&strict.to_toml()?)?;
    assert_eq!(strict.core.ratio_threshold, from_json.core.ratio_threshold);
    assert_eq!(strict.core.ratio_threshold, from_toml.core.ratio_threshold);
    assert_eq!(strict.seed, from_json.seed);
    assert_eq!(strict.agreement, from_toml.agreement);
    println!("   ✅ Round-trip serialization is consistent");

    // Demo 8: Config to matcher
    println!("\n🎯 Demo 8: Building Matchers from Files");
    let configured = loaded_json.to_builder().build()?;
    println!("   {}", configured.config_summary());

    println!("\n🎉 Configuration serialization demo completed successfully!");
    println!("📁 Generated files:");
    println!("   • strict_config.json / strict_config.toml");
    println!("   • permissive_config.json");
    println!("   • custom_config.toml");

    Ok(())
}
