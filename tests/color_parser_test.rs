use openduck::config::{rgb_to_256_color, rgb_to_basic_ansi, ColorParser, Theme, ThemeConfig};
use ratatui::style::Color;

// Theme::from_config detects NO_COLOR; keep it out of the way
fn ensure_colors_enabled() {
    std::env::remove_var("NO_COLOR");
}

#[test]
fn test_parse_named_colors() {
    let parser = ColorParser::with_capabilities(true, true);

    assert_eq!(parser.parse("black").unwrap(), Color::Black);
    assert_eq!(parser.parse("red").unwrap(), Color::Red);
    assert_eq!(parser.parse("cyan").unwrap(), Color::Cyan);
    assert_eq!(parser.parse("bright_red").unwrap(), Color::Indexed(9));
    assert_eq!(parser.parse("bright blue").unwrap(), Color::Indexed(12));
    assert_eq!(parser.parse("dark_gray").unwrap(), Color::Indexed(8));
    assert_eq!(parser.parse("light grey").unwrap(), Color::Indexed(7));
}

#[test]
fn test_parse_is_case_and_whitespace_insensitive() {
    let parser = ColorParser::with_capabilities(true, true);

    assert_eq!(parser.parse("RED").unwrap(), Color::Red);
    assert_eq!(parser.parse("  Cyan ").unwrap(), Color::Cyan);
    assert_eq!(parser.parse("Indexed( 42 )").unwrap(), Color::Indexed(42));
}

#[test]
fn test_parse_hex_by_capability() {
    let true_color = ColorParser::with_capabilities(true, true);
    assert_eq!(true_color.parse("#ff8000").unwrap(), Color::Rgb(255, 128, 0));
    assert_eq!(true_color.parse("#FF8000").unwrap(), Color::Rgb(255, 128, 0));

    let palette = ColorParser::with_capabilities(false, true);
    assert_eq!(palette.parse("#ff0000").unwrap(), Color::Indexed(196));

    let basic = ColorParser::with_capabilities(false, false);
    assert_eq!(basic.parse("#ff0000").unwrap(), Color::Red);
}

#[test]
fn test_parse_rejects_bad_values() {
    let parser = ColorParser::with_capabilities(true, true);

    assert!(parser.parse("#ff00").is_err());
    assert!(parser.parse("#gg0000").is_err());
    assert!(parser.parse("indexed(256)").is_err());
    assert!(parser.parse("indexed(x)").is_err());
    let err = parser.parse("chartreuse").unwrap_err().to_string();
    assert!(err.contains("Unknown color name"));
}

#[test]
fn test_modifier_names_parse_as_reset() {
    let parser = ColorParser::with_capabilities(true, true);
    assert_eq!(parser.parse("reset").unwrap(), Color::Reset);
    assert_eq!(parser.parse("reversed").unwrap(), Color::Reset);
}

#[test]
fn test_rgb_to_256_color() {
    assert_eq!(rgb_to_256_color(0, 0, 0), 16);
    assert_eq!(rgb_to_256_color(255, 255, 255), 231);
    assert_eq!(rgb_to_256_color(128, 128, 128), 244);
    assert_eq!(rgb_to_256_color(255, 0, 0), 196);
    assert_eq!(rgb_to_256_color(0, 255, 0), 46);
    assert_eq!(rgb_to_256_color(0, 0, 255), 21);
}

#[test]
fn test_rgb_to_basic_ansi() {
    assert_eq!(rgb_to_basic_ansi(0, 0, 0), Color::Black);
    assert_eq!(rgb_to_basic_ansi(200, 200, 200), Color::White);
    assert_eq!(rgb_to_basic_ansi(255, 0, 0), Color::Red);
    assert_eq!(rgb_to_basic_ansi(0, 200, 200), Color::Cyan);
}

#[test]
fn test_theme_from_default_config() {
    ensure_colors_enabled();
    let theme = Theme::from_config(&ThemeConfig::default()).unwrap();

    assert_eq!(theme.get("primary"), Color::Cyan);
    assert_eq!(theme.get("error"), Color::Red);
    assert_eq!(theme.get("controls_bg"), Color::Indexed(236));
    assert_eq!(theme.get("table_selected"), Color::Reset);
    assert_eq!(theme.get("not_a_color"), Color::Reset);
    assert_eq!(theme.get_optional("not_a_color"), None);
    assert_eq!(theme.get_optional("directory"), Some(Color::Blue));
}

#[test]
fn test_theme_with_custom_and_invalid_colors() {
    ensure_colors_enabled();
    let mut config = ThemeConfig::default();
    config.colors.primary = "magenta".to_string();
    config.colors.null_value = "indexed(240)".to_string();
    let theme = Theme::from_config(&config).unwrap();
    assert_eq!(theme.get("primary"), Color::Magenta);
    assert_eq!(theme.get("null_value"), Color::Indexed(240));

    config.colors.error = "not a color".to_string();
    assert!(Theme::from_config(&config).is_err());
}
