//! Static substitution tables.
//!
//! Every table is ASCII, holds at most 254 entries and is ordered by
//! descending entry length. Compiled snapshots record a fingerprint of
//! these tables, so changing any entry invalidates existing snapshots.

/// Frequent substrings of `$csp=` directive values.
pub static NETWORK_CSP: &[&str] = &[
    "sandbox allow-forms allow-same-origin allow-scripts allow-modals allow-orientation-lock allow-pointer-lock allow-presentation allow-top-navigation",
    "script-src 'self' 'unsafe-inline' 'unsafe-eval' data:",
    " *.google.com *.gstatic.com *.googleapis.com",
    ".com *.google.com *.googletagmanager.com *.",
    "script-src 'self' '*' 'unsafe-inline'",
    "default-src 'self' 'unsafe-inline'",
    "default-src 'unsafe-inline' 'self'",
    "script-src 'self' 'unsafe-inline' ",
    "script-src * 'unsafe-inline'",
    "*.googletagmanager.com *.",
    ".com *.googleapis.com *.",
    " *.gstatic.com *.google",
    ".com *.bootstrapcdn.com",
    ".com *.google-analytics",
    ".com *.gstatic.com *.",
    "default-src 'self'",
    "frame-src 'self' *",
    " *.cloudflare.com",
    "child-src 'none';",
    "worker-src 'none'",
    " 'unsafe-inline'",
    "'unsafe-eval'",
    "connect-src ",
    "child-src *",
    "script-src ",
    "script-src",
    "style-src ",
    " *.google",
    "frame-src",
    "facebook",
    "https://",
    ".com *.",
    ".net *.",
    "addthis",
    "captcha",
    "gstatic",
    "youtube",
    " data:",
    "'self'",
    "disqus",
    "google",
    "jquery",
    " http",
    "blob:",
    "media",
    "ytimg",
    ".com",
    ".net",
    "apis",
    "n.cc",
    " *.",
    "age",
    "cdn",
    "tag",
    "tra",
    "vic",
    " *",
    "*.",
    "an",
    "ch",
    "de",
    "er",
    "es",
    "fa",
    "ic",
    "im",
    "in",
    "on",
    "rc",
    "re",
    "wi",
    "wp",
    " ",
    "-",
    ";",
    ":",
    ".",
    "'",
    "*",
    "/",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
];

/// Frequent substrings of network filter patterns.
pub static NETWORK_FILTER: &[&str] = &[
    ":style(width:1px!important;height:1px!important;min-width:1px!important;min-height:1px!important;margin:0!important;padding:0!important;overflow:hidden!important;opacity:0!important)",
    "\\/[a-d][-\\.\\/_A-Za-z][DHWXm][-\\.\\/_A-Za-z][59FVZ][-\\.\\/_A-Za-z][6swyz][-\\.\\/_A-Za-z][-\\/_0-9a-zA-Z][-\\.\\/_A-Za-z][-\\/_0-9a-zA-Z]{22,162}$/",
    "/homad-global-configs.schneevonmorgen.com/global_config",
    "[\\/][\\/a-zA-Z0-9]{3,}\\/[a-zA-Z0-9]{6,}\\/.*/",
    "\\.com[\\/]{1,}.*[a-zA-Z0-9]{",
    "/pagead/js/adsbygoogle.js",
    "/^https?:\\/\\/(.+?\\.)?",
    "/js/sdkloader/ima3.js",
    "/sites/default/files/",
    "/wp-content/plugins/",
    "/wp-content/uploads/",
    "/wp-content/themes/",
    "/detroitchicago/",
    ".*[a-zA-Z0-9]{",
    "/cdn-cgi/trace",
    "\\/[a-zA-Z0-9]{",
    "/^https?:\\/\\/",
    "/^https:\\/\\",
    "0-9a-zA-Z]",
    "impression",
    "[0-9a-f]{",
    "[0-9a-z]{",
    "affiliate",
    "analytics",
    "/assets/",
    "/images/",
    "comscore",
    "template",
    "tracking",
    "300x250",
    "collect",
    "consent",
    "content",
    "counter",
    "default",
    "sponsor",
    "visitor",
    ".aspx?",
    "/embed",
    "728x90",
    "banner",
    "beacon",
    "client",
    "cookie",
    "google",
    "metric",
    "module",
    "prebid",
    "rivacy",
    "script",
    "source",
    "widget",
    ".cgi?",
    ".com/",
    ".html",
    "/api/",
    "/file",
    "/img/",
    "/java",
    "/page",
    "/stat",
    "/uplo",
    "0x600",
    "a-z]{",
    "block",
    "click",
    "clude",
    "count",
    "event",
    "frame",
    "image",
    "manag",
    "media",
    "pixel",
    "track",
    "type=",
    "video",
    ".gif",
    ".jpg",
    ".php",
    ".png",
    "/jqu",
    "/js/",
    "/lib",
    "/web",
    "bung",
    "code",
    "data",
    "eoip",
    "gi-b",
    "http",
    "ight",
    "page",
    "stat",
    "view",
    ".js",
    "/ad",
    "/js",
    "^*/",
    "=*&",
    "468",
    "aff",
    "dpr",
    "ext",
    "how",
    "jax",
    "lay",
    "log",
    "lug",
    "new",
    "sdk",
    "tag",
    "und",
    "web",
    "-p",
    ".m",
    "*/",
    "*^",
    "/_",
    "/?",
    "/*",
    "/d",
    "/f",
    "/g",
    "/h",
    "/m",
    "/n",
    "/p",
    "/r",
    "/u",
    "/w",
    "\\/",
    "00",
    "a-",
    "ac",
    "ad",
    "ag",
    "al",
    "am",
    "an",
    "ap",
    "ar",
    "as",
    "at",
    "bo",
    "ce",
    "ch",
    "de",
    "e_",
    "e-",
    "e/",
    "ec",
    "ed",
    "el",
    "em",
    "en",
    "er",
    "et",
    "g/",
    "ic",
    "id",
    "ig",
    "il",
    "im",
    "in",
    "is",
    "it",
    "la",
    "le",
    "li",
    "lo",
    "no",
    "ob",
    "ol",
    "om",
    "on",
    "op",
    "or",
    "ot",
    "p-",
    "pt",
    "re",
    "ro",
    "s_",
    "s-",
    "s?",
    "s/",
    "sp",
    "ss",
    "st",
    "t/",
    "ti",
    "tm",
    "tr",
    "ub",
    "um",
    "un",
    "up",
    "ur",
    "us",
    "ut",
    "ve",
    "_",
    "-",
    ",",
    ":",
    "?",
    ".",
    "(",
    "[",
    "}",
    "*",
    "/",
    "\\",
    "&",
    "^",
    "=",
    "|",
    "0",
    "1",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
];

/// Frequent substrings of raw network filter lines, hostnames and option values.
pub static RAW_NETWORK: &[&str] = &[
    ",redirect-rule=noopjs,domain",
    "googleapis.com/js/sdkloader/",
    "googlesyndication.com/pagead",
    "*$script,3p,denyallow=",
    "/wp-content/plugins/",
    "/wp-content/uploads/",
    ".com^$third-party",
    "administratormail",
    ".cloudfront.net^",
    ".zooplusmail-aws",
    ",redirect-rule=",
    "$script,domain=",
    ",redirect=noop",
    "|downdetector.",
    "xmlhttprequest",
    ".actonservice",
    ".net.zooplus.",
    "/^https?:\\/\\/",
    "^$third-party",
    "a-zA-Z0-9]{",
    "doubleclick",
    "subdocument",
    "third-party",
    "cloudflare",
    "marketing.",
    "analytics",
    "/assets/",
    "metrics.",
    "tracking",
    ".zoossl",
    "$script",
    "captcha",
    "collect",
    "domain=",
    "imasdk.",
    ".co.uk",
    "$ghide",
    "cookie",
    "google",
    "script",
    ".com^",
    ".xyz^",
    "count",
    "frame",
    "image",
    "media",
    "track",
    "video",
    ".com",
    ".gif",
    ".net",
    ".php",
    "/js/",
    "$xhr",
    "html",
    "stat",
    "www.",
    ",1p",
    ".de",
    ".io",
    ".jp",
    ".js",
    ".ru",
    "$3p",
    "aff",
    "cdn",
    "new",
    "pro",
    "web",
    ".b",
    ".c",
    ".f",
    ".m",
    ".n",
    ".p",
    ".s",
    ".t",
    "@@",
    "*/",
    "/*",
    "/b",
    "/p",
    "||",
    "|~",
    "a-",
    "ab",
    "ac",
    "ad",
    "af",
    "ag",
    "ak",
    "al",
    "am",
    "an",
    "ap",
    "ar",
    "as",
    "at",
    "au",
    "av",
    "aw",
    "ay",
    "az",
    "be",
    "bo",
    "br",
    "ce",
    "ch",
    "ck",
    "cl",
    "de",
    "di",
    "do",
    "dr",
    "e-",
    "e^",
    "eb",
    "ec",
    "ed",
    "el",
    "em",
    "en",
    "ep",
    "er",
    "es",
    "et",
    "ev",
    "ex",
    "fa",
    "fo",
    "fr",
    "ge",
    "go",
    "gr",
    "he",
    "ho",
    "ib",
    "ic",
    "id",
    "ie",
    "ig",
    "ik",
    "il",
    "im",
    "in",
    "io",
    "ip",
    "ir",
    "is",
    "it",
    "iv",
    "ix",
    "iz",
    "js",
    "le",
    "li",
    "lo",
    "ly",
    "ma",
    "mo",
    "mp",
    "my",
    "no",
    "ol",
    "om",
    "on",
    "oo",
    "op",
    "or",
    "ot",
    "ow",
    "pl",
    "po",
    "pr",
    "qu",
    "re",
    "ro",
    "s-",
    "s/",
    "sc",
    "se",
    "sh",
    "si",
    "so",
    "sp",
    "ss",
    "st",
    "t-",
    "te",
    "th",
    "ti",
    "to",
    "tr",
    "ts",
    "ub",
    "ud",
    "ug",
    "ul",
    "um",
    "un",
    "up",
    "ur",
    "us",
    "ut",
    "ve",
    "_",
    "-",
    ",",
    "?",
    ".",
    "*",
    "/",
    "\\",
    "^",
    "=",
    "|",
    "~",
    "$",
    "0",
    "1",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
];

/// Frequent substrings of cosmetic selectors.
pub static COSMETIC_SELECTOR: &[&str] = &[
    ":style(display:none!important)",
    "[target=\"_blank\"]",
    ":-abp-contains(",
    ":matches-css(",
    ":nth-of-type(",
    "[data-testid=",
    "advertisement",
    ":first-child",
    "[aria-label=",
    ":nth-child(",
    ":last-child",
    "advertising",
    "placeholder",
    "adsbygoogle",
    "leaderboard",
    ":-abp-has(",
    ":has-text(",
    "skyscraper",
    ":remove()",
    "[class^=\"",
    "[class*=\"",
    "sponsored",
    "container",
    "affiliate",
    "billboard",
    "rectangle",
    ":upward(",
    "[href^=\"",
    "[href*=\"",
    "[onclick",
    "outbrain",
    ":xpath(",
    "[src*=\"",
    "[title=",
    "wrapper",
    "sidebar",
    "content",
    "section",
    "article",
    "overlay",
    "consent",
    "adsense",
    "taboola",
    "partner",
    "desktop",
    "[id^=\"",
    "[id*=\"",
    "[data-",
    "[style",
    "[role=",
    "widget",
    "banner",
    "header",
    "footer",
    "cookie",
    "notice",
    "google",
    "teaser",
    "native",
    "bottom",
    "iframe",
    "script",
    "mobile",
    "square",
    "sticky",
    ":not(",
    ":has(",
    "popup",
    "modal",
    "promo",
    "right",
    "block",
    "inner",
    "outer",
    "aside",
    "frame",
    "label",
    "title",
    "fixed",
    "float",
    "left",
    "wrap",
    "area",
    "slot",
    "unit",
    "span",
    "ins.",
    "body",
    "html",
    "link",
    "text",
    "item",
    "list",
    "main",
    "page",
    "post",
    "view",
    "-ad-",
    "_ad_",
    "-ads",
    "_ads",
    "dfp",
    "top",
    "box",
    "div",
    "img",
    "ad-",
    "ad_",
    "ads",
    "#ad",
    ".ad",
    " > ",
    " + ",
    " ~ ",
    "Ad",
    "ad",
    "> ",
    "\"]",
    "']",
    "=\"",
    "^=",
    "*=",
    "$=",
    "~=",
    "|=",
    "\"",
    "'",
    "[",
    "]",
    "(",
    ")",
    ",",
    ".",
    "#",
    ":",
    "-",
    "_",
    " ",
    ">",
    "+",
    "~",
    "*",
    "=",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "0",
    "1",
    "2",
    "3",
];
