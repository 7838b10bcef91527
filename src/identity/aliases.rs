//! Static alias and mascot tables for team-name resolution.
//!
//! Keys are written the way sources print them; they are normalized once
//! when the resolver is built, so punctuation and case here don't matter.

/// Source spelling → canonical team name.
pub(crate) const ALIASES: &[(&str, &str)] = &[
    // "St." schools
    ("Ball St.", "Ball State"),
    ("San Diego St.", "San Diego State"),
    ("SDSU", "San Diego State"),
    ("Arizona St.", "Arizona State"),
    ("Iowa St.", "Iowa State"),
    ("Oklahoma St.", "Oklahoma State"),
    ("Kansas St.", "Kansas State"),
    ("Michigan St.", "Michigan State"),
    ("Mississippi St.", "Mississippi State"),
    ("Florida St.", "Florida State"),
    ("Penn St.", "Penn State"),
    ("PSU", "Penn State"),
    ("San Jose St.", "San Jose State"),
    ("Fresno St.", "Fresno State"),
    ("Boise St.", "Boise State"),
    ("Colorado St.", "Colorado State"),
    ("New Mexico St.", "New Mexico State"),
    ("Utah St.", "Utah State"),
    ("Morgan St.", "Morgan State"),
    ("NC State", "North Carolina State"),
    ("N.C. State", "North Carolina State"),
    // "Saint" schools
    ("St. Peter's", "Saint Peters"),
    ("Saint Peter's", "Saint Peters"),
    ("St. Mary's", "Saint Marys"),
    ("Saint Mary's", "Saint Marys"),
    ("St. Francis", "Saint Francis"),
    ("St. John's", "Saint Johns"),
    ("Saint John's", "Saint Johns"),
    ("St. Bonaventure", "Saint Bonaventure"),
    ("St. Louis", "Saint Louis"),
    ("St. Thomas", "Saint Thomas"),
    ("St. Anselm", "Saint Anselm"),
    // Abbreviations
    ("Texas A&M", "Texas A&M"),
    ("TAMU", "Texas A&M"),
    ("TCU", "Texas Christian"),
    ("SMU", "Southern Methodist"),
    ("USC", "Southern California"),
    ("Southern Cal", "Southern California"),
    ("VCU", "Virginia Commonwealth"),
    ("UConn", "Connecticut"),
    ("U Conn", "Connecticut"),
    ("UNC", "North Carolina"),
    ("N.C.", "North Carolina"),
    ("UNCG", "UNC Greensboro"),
    ("North Carolina Greensboro", "UNC Greensboro"),
    ("UVA", "Virginia"),
    ("U Va", "Virginia"),
    ("UNLV", "Nevada Las Vegas"),
    ("Nevada (Las Vegas)", "Nevada Las Vegas"),
    ("UTEP", "Texas El Paso"),
    ("UCF", "Central Florida"),
    ("UAB", "Alabama Birmingham"),
    ("LSU", "Louisiana State"),
    ("Miami (FL)", "Miami Florida"),
    ("Miami Fl", "Miami Florida"),
    ("Miami Fla", "Miami Florida"),
    ("Miami (OH)", "Miami Ohio"),
    ("Miami Oh", "Miami Ohio"),
    ("NJIT", "New Jersey Institute Technology"),
    ("UMass", "Massachusetts"),
    ("UMass Lowell", "Massachusetts Lowell"),
    ("SIU", "Southern Illinois"),
    ("NIU", "Northern Illinois"),
    ("UIC", "Illinois Chicago"),
    ("MTSU", "Middle Tennessee"),
    ("The Citadel", "Citadel"),
    ("VMI", "Virginia Military"),
    ("Ohio", "Ohio University"),
    ("ECU", "East Carolina"),
    ("Ole Miss", "Mississippi"),
    ("VTech", "Virginia Tech"),
    ("WVU", "West Virginia"),
    // Canonical names that only appear on the right-hand side elsewhere
    ("Texas Tech", "Texas Tech"),
    ("Boston College", "Boston College"),
    ("Wake Forest", "Wake Forest"),
    ("Seton Hall", "Seton Hall"),
    ("Rutgers", "Rutgers"),
    ("High Point", "High Point"),
    ("Chattanooga", "Chattanooga"),
    ("Merrimack", "Merrimack"),
    ("Quinnipiac", "Quinnipiac"),
    ("Sacred Heart", "Sacred Heart"),
    ("Rider", "Rider"),
    ("Marist", "Marist"),
    ("Creighton", "Creighton"),
    ("Providence", "Providence"),
    ("Wyoming", "Wyoming"),
];

/// Mascot suffixes stripped before matching ("Duke Blue Devils" → "duke").
/// Multi-word entries come first so they win over their last word.
pub(crate) const MASCOTS: &[&str] = &[
    "blue devils",
    "tar heels",
    "red raiders",
    "golden eagles",
    "fighting irish",
    "nittany lions",
    "crimson tide",
    "horned frogs",
    "sun devils",
    "demon deacons",
    "yellow jackets",
    "blue demons",
    "red storm",
    "runnin rebels",
    "wildcats",
    "bulldogs",
    "tigers",
    "bears",
    "jayhawks",
    "huskies",
    "gaels",
    "zags",
    "cardinals",
    "cougars",
    "eagles",
    "hawks",
    "hoyas",
    "rebels",
    "spartans",
    "wolverines",
    "buckeyes",
    "hoosiers",
    "boilermakers",
    "badgers",
    "gophers",
    "hawkeyes",
    "cyclones",
    "longhorns",
    "sooners",
    "aggies",
    "razorbacks",
    "volunteers",
    "gators",
    "seminoles",
    "hurricanes",
    "cavaliers",
    "hokies",
    "mountaineers",
    "bluejays",
    "friars",
    "pirates",
    "musketeers",
    "bonnies",
    "billikens",
    "rams",
    "broncos",
    "aztecs",
    "lobos",
    "utes",
    "bruins",
    "trojans",
    "ducks",
    "beavers",
    "falcons",
    "owls",
    "panthers",
    "knights",
    "mustangs",
    "peacocks",
];
