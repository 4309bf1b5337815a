//! Built-in product set installed by `Catalog::reset_to_default`.
//!
//! Prices are in USD. A price of `0.0` marks a product whose price must be
//! entered by hand.

pub(crate) const DEFAULT_PRODUCTS: &[(&str, &str, f64)] = &[
    ("HF32", "Oxygen propane on a French network hose", 5.0),
    ("HF37", "Oxygen propeller on a German network hose", 4.0),
    ("HF55", "Probe oxygen flowmeter network English", 5.0),
    ("HF36", "German network oxygen flowmeter probe", 4.0),
    ("HF39", "French network oxygen probe flowmeter", 5.0),
    ("HF33", "Oxygen propane on an American network hose", 6.0),
    ("HF64", "Long German network oxygen flowmeter probe", 5.0),
    ("HF23", "American network oxygen flowmeter probe", 5.0),
    ("HF84", "German mesh suction regulator probe", 5.0),
    ("HF24", "American Network Suction Regulator Probe", 5.0),
    ("HF40", "English network suction regulator probe", 5.0),
    ("HF75", "Air Flow Meter Network Probe", 5.0),
    ("HF43", "Air propeller on German network hose", 4.0),
    ("HF34", "L type flume meter prop adapter", 2.5),
    ("HF44", "German network air flowmeter probe", 4.0),
    ("HF38", "French network air flowmeter probe", 5.0),
    ("HF53", "Chamber Children's Consumer", 3.0),
    ("HF57", "Chambers Consumer Majors", 3.0),
    ("HF85", "Permanent children's chamber", 16.0),
    ("HF60", "Bottom connection of the flowmeter to the hose", 1.5),
    ("HF27", "Upper part of the oxygen flowmeter with the German network probe", 10.0),
    ("HF26", "Upper part oxygen flowmeter with probe network", 10.0),
    ("HF06", "Oxygen regulator tubes in Al-Koura", 3.5),
    ("HF14", "2L Sterilizable Shockproof Suction Jar", 7.5),
    ("HF17", "Upper part of the oxygen flowmeter with the French network probe", 10.0),
    ("HF74", "Upper part of the air flowmeter with a German mesh probe", 10.0),
    ("HF63", "French mesh air flow meter upper part", 10.0),
    ("HF16", "2L suction jar skin", 2.0),
    ("HF58", "Joan Cobb Flowmeter", 1.0),
    ("HF15", "2L Sterilizable Shockproof Suction Jar Lid", 6.0),
    ("HF05", "Metal filter for flowmeter", 1.5),
    ("HF54", "Metal oxygen flowmeter, two-piece network, English", 13.5),
    ("HF10", "One-piece metal flowmeter, French network", 0.0),
    ("HF46", "Meter meter metal oxygen two pieces German network", 13.5),
    ("HF13", "Two-piece air metal flowmeter, French mesh", 13.5),
    ("HF04", "small flowmeter cup", 2.5),
    ("HF48", "Large flowmeter cup without humidifier", 3.0),
    ("HF59", "Oxygen humidifier flowmeter made by Al-Hikma Office (Chinese flowmeter)", 7.0),
    ("HF47", "Oxygen humidifier flowmeter made by Al-Hikma Office (regular flowmeter)", 7.0),
    ("HF18", "Small humidifier flowmeter cup", 0.0),
    ("HF65", "Humidifier flowmeter made by Al-Hikma Office (regular flowmeter)", 4.0),
    ("HF25", "Bottom Probe Flowmeter Adapter for Network", 0.0),
    ("HF67", "Oxygen regulator for cylinder without humidifier", 23.0),
    ("HF78", "HEO brand suction device, French network", 0.0),
    ("hf89", "Turkish suction regulator trap", 7.0),
    ("hf102", "Newborn Y-shaped pacifier with sterilizable plug", 5.0),
    ("hf104", "Loctide red adhesive", 0.0),
    ("HF105", "Large sterilizable soil", 6.0),
    ("HF107", "Upper part oxygen flowmeter with probe wisdom network German long", 10.5),
    ("HF108", "1 Liter Sterilizable Shockproof Suction Jar", 6.5),
    ("HF110", "Children's permanent chamber without base", 0.0),
    ("HF111", "Connector 22/10", 2.0),
    ("hf113", "Cover, 1 liter full suction jar", 5.0),
    ("HF115", "French director oxygen brand (H)", 14.0),
    ("HF117", "French outlet suction brand", 14.0),
    ("HF118", "humidifier nut adapter", 2.5),
    ("HF119", "Plastic palm connector", 1.5),
    ("HF120", "Pump drawing a heart with a nail, Wisdom Office", 10.5),
    ("HF122", "Wisdom Suction Regulator Probe Network English", 1.5),
    ("HF83", "French suction regulator with key", 27.0),
];
